//! Edge-preserving bilateral filter for finished renders.
//!
//! Each output pixel is a weighted average of its neighborhood. Weights fall
//! off with pixel distance (spatial sigma) and with color difference from the
//! center pixel (range sigma), so noise is smoothed while edges survive.

use image::RgbaImage;
use rayon::prelude::*;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("spatial sigma must be positive and finite, got {0}")]
    InvalidSpatialSigma(f32),

    #[error("range sigma must be positive and finite, got {0}")]
    InvalidRangeSigma(f32),
}

fn check_sigma(sigma: f32) -> bool {
    sigma.is_finite() && sigma > 0.0
}

/// Filter an image. The result has the same dimensions as the input.
///
/// Channels are compared on a `[0, 1]` scale, alpha included. Neighbors
/// outside the image are skipped rather than clamped.
pub fn bilateral_filter(input: &RgbaImage, spatial_sigma: f32, range_sigma: f32) -> Result<RgbaImage, FilterError> {
    if !check_sigma(spatial_sigma) {
        return Err(FilterError::InvalidSpatialSigma(spatial_sigma));
    }
    if !check_sigma(range_sigma) {
        return Err(FilterError::InvalidRangeSigma(range_sigma));
    }

    let (width, height) = input.dimensions();
    if width == 0 || height == 0 {
        return Ok(input.clone());
    }

    // No offset can reach past the far edge of the image.
    let max_radius = i64::from(width.max(height)) - 1;
    let radius = ((3.0 * f64::from(spatial_sigma)).ceil() as i64).min(max_radius);
    let spatial_denom = 2.0 * f64::from(spatial_sigma).powi(2);
    let range_denom = 2.0 * f64::from(range_sigma).powi(2);

    // The spatial Gaussian is separable: weight(kx, ky) = axis[kx] * axis[ky].
    let axis: Vec<f64> = (-radius..=radius)
        .map(|k| (-((k * k) as f64) / spatial_denom).exp())
        .collect();

    let channels = |x: i64, y: i64| input.get_pixel(x as u32, y as u32).0.map(|c| f64::from(c) / 255.0);

    let mut output = RgbaImage::new(width, height);
    let row_len = width as usize * 4;

    output.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
        let y = y as i64;
        for x in 0..i64::from(width) {
            let center = channels(x, y);
            let mut sum = [0.0f64; 4];
            let mut total_weight = 0.0;

            // Out-of-bounds neighbors are skipped.
            let (y_lo, y_hi) = ((-radius).max(-y), radius.min(i64::from(height) - 1 - y));
            let (x_lo, x_hi) = ((-radius).max(-x), radius.min(i64::from(width) - 1 - x));

            for ky in y_lo..=y_hi {
                let weight_y = axis[(ky + radius) as usize];
                for kx in x_lo..=x_hi {
                    let neighbor = channels(x + kx, y + ky);
                    let color_dist: f64 = center.iter().zip(&neighbor).map(|(a, b)| (a - b) * (a - b)).sum();
                    let weight = weight_y * axis[(kx + radius) as usize] * (-color_dist / range_denom).exp();

                    for (acc, value) in sum.iter_mut().zip(neighbor) {
                        *acc += value * weight;
                    }
                    total_weight += weight;
                }
            }

            // The center pixel always contributes weight 1.
            let pixel = &mut row[x as usize * 4..x as usize * 4 + 4];
            for (out, acc) in pixel.iter_mut().zip(sum) {
                *out = (acc / total_weight * 255.0).round().clamp(0.0, 255.0) as u8;
            }
        }
    });

    Ok(output)
}
