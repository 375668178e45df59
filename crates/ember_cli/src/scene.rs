//! JSON scene descriptions.
//!
//! A scene file names its materials once and refers to them from spheres:
//!
//! ```json
//! {
//!   "camera": { "image_width": 320, "look_from": [13, 2, 3], "look_at": [0, 0, 0] },
//!   "materials": {
//!     "ground": { "type": "diffuse", "albedo": [0.5, 0.5, 0.5] },
//!     "glass": { "type": "dielectric", "ior": 1.5 }
//!   },
//!   "spheres": [
//!     { "center": [0, -1000, 0], "radius": 1000, "material": "ground" },
//!     { "center": [0, 1, 0], "radius": 1, "material": "glass" }
//!   ]
//! }
//! ```

use ember_renderer::{CameraConfig, Color, Material, MaterialError, Sphere, Vec3, World};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid scene file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Material '{name}' is invalid: {source}")]
    InvalidMaterial { name: String, source: MaterialError },

    #[error("Sphere {index} has a non-finite center or radius ({radius})")]
    InvalidSphere { index: usize, radius: f32 },

    #[error("Sphere {index} uses unknown material '{name}'")]
    UnknownMaterial { index: usize, name: String },
}

pub type SceneResult<T> = Result<T, SceneError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SphereDescription {
    pub center: Vec3,
    pub radius: f32,
    /// Key into the scene's material table
    pub material: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    pub camera: CameraConfig,
    pub materials: BTreeMap<String, Material>,
    pub spheres: Vec<SphereDescription>,
}

impl SceneDescription {
    pub fn from_json(json: &str) -> SceneResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> SceneResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Ground plane plus three large spheres, seen through a shallow depth of field.
    pub fn demo() -> Self {
        let materials = BTreeMap::from([
            ("ground".to_string(), Material::diffuse(Color::splat(0.5))),
            ("rose".to_string(), Material::diffuse(Color::new(0.93, 0.74, 0.74))),
            ("sand".to_string(), Material::diffuse(Color::new(0.89, 0.78, 0.56))),
            ("sage".to_string(), Material::diffuse(Color::new(0.65, 0.81, 0.53))),
        ]);

        let sphere = |center: Vec3, radius: f32, material: &str| SphereDescription {
            center,
            radius,
            material: material.to_string(),
        };

        Self {
            camera: CameraConfig {
                image_width: 320,
                aspect_ratio: 16.0 / 9.0,
                samples_per_pixel: 100,
                max_depth: 50,
                vfov: 20.0,
                look_from: Vec3::new(13.0, 2.0, 3.0),
                look_at: Vec3::ZERO,
                vup: Vec3::Y,
                defocus_angle: 0.6,
                focus_dist: 10.0,
            },
            materials,
            spheres: vec![
                sphere(Vec3::new(0.0, -1000.0, -1.0), 1000.0, "ground"),
                sphere(Vec3::new(0.0, 1.0, 0.0), 1.0, "rose"),
                sphere(Vec3::new(-4.0, 1.0, 0.0), 1.0, "sand"),
                sphere(Vec3::new(4.0, 1.0, 0.0), 1.0, "sage"),
            ],
        }
    }

    /// Build the renderable world. Spheres naming the same material share it.
    pub fn build_world(&self) -> SceneResult<World> {
        for (name, material) in &self.materials {
            material.validate().map_err(|source| SceneError::InvalidMaterial {
                name: name.clone(),
                source,
            })?;
        }

        let materials: BTreeMap<&str, Arc<Material>> = self
            .materials
            .iter()
            .map(|(name, material)| (name.as_str(), Arc::new(*material)))
            .collect();

        let mut world = World::new();
        for (index, sphere) in self.spheres.iter().enumerate() {
            let material = materials
                .get(sphere.material.as_str())
                .ok_or_else(|| SceneError::UnknownMaterial {
                    index,
                    name: sphere.material.clone(),
                })?;
            if !(sphere.center.is_finite() && sphere.radius.is_finite()) {
                return Err(SceneError::InvalidSphere {
                    index,
                    radius: sphere.radius,
                });
            }
            world.add(Sphere::new(sphere.center, sphere.radius, Arc::clone(material)));
        }

        world.prepare();
        log::debug!("Built world: {} spheres, {} materials", world.len(), materials.len());
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_renderer::Camera;

    const SCENE: &str = r#"{
        "camera": { "image_width": 64, "samples_per_pixel": 4, "look_from": [0, 0, 2], "look_at": [0, 0, 0] },
        "materials": {
            "chrome": { "type": "metal", "albedo": [0.8, 0.8, 0.8] },
            "glass": { "type": "dielectric", "ior": 1.5 }
        },
        "spheres": [
            { "center": [0, 0, 0], "radius": 0.5, "material": "glass" },
            { "center": [1, 0, 0], "radius": 0.25, "material": "chrome" }
        ]
    }"#;

    #[test]
    fn test_parse_scene_file() {
        let scene = SceneDescription::from_json(SCENE).unwrap();

        assert_eq!(scene.camera.image_width, 64);
        assert_eq!(scene.camera.samples_per_pixel, 4);
        // Unlisted camera fields keep their defaults.
        assert_eq!(scene.camera.max_depth, CameraConfig::default().max_depth);
        assert_eq!(scene.materials["chrome"], Material::metal(Color::splat(0.8), 0.0));
        assert_eq!(scene.materials["glass"], Material::dielectric(1.5));
        assert_eq!(scene.spheres.len(), 2);
        assert_eq!(scene.spheres[1].center, Vec3::new(1.0, 0.0, 0.0));

        let world = scene.build_world().unwrap();
        assert_eq!(world.len(), 2);
        assert!(Camera::new(scene.camera).is_ok());
    }

    #[test]
    fn test_unknown_material_rejected() {
        let json = r#"{ "spheres": [ { "center": [0, 0, 0], "radius": 1, "material": "velvet" } ] }"#;
        let scene = SceneDescription::from_json(json).unwrap();

        match scene.build_world() {
            Err(SceneError::UnknownMaterial { index, name }) => {
                assert_eq!(index, 0);
                assert_eq!(name, "velvet");
            }
            other => panic!("expected UnknownMaterial, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_material_rejected() {
        let json = r#"{
            "materials": { "glass": { "type": "dielectric", "ior": 0.0 } },
            "spheres": [ { "center": [0, 0, -2], "radius": 1, "material": "glass" } ]
        }"#;
        let scene = SceneDescription::from_json(json).unwrap();

        match scene.build_world() {
            Err(SceneError::InvalidMaterial { name, source }) => {
                assert_eq!(name, "glass");
                assert_eq!(source, MaterialError::InvalidIor(0.0));
            }
            other => panic!("expected InvalidMaterial, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_albedo_rejected() {
        let json = r#"{ "materials": { "ink": { "type": "diffuse", "albedo": [0.2, -1, 0.2] } } }"#;
        let scene = SceneDescription::from_json(json).unwrap();
        assert!(matches!(
            scene.build_world(),
            Err(SceneError::InvalidMaterial { source: MaterialError::InvalidAlbedo(_), .. })
        ));
    }

    #[test]
    fn test_non_finite_sphere_rejected() {
        let mut scene = SceneDescription::demo();
        scene.spheres[2].radius = f32::INFINITY;
        assert!(matches!(
            scene.build_world(),
            Err(SceneError::InvalidSphere { index: 2, .. })
        ));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            SceneDescription::from_json("{ \"spheres\": 3 }"),
            Err(SceneError::Json(_))
        ));
    }

    #[test]
    fn test_demo_scene_is_valid() {
        let scene = SceneDescription::demo();
        let world = scene.build_world().unwrap();
        assert_eq!(world.len(), 4);

        let camera = Camera::new(scene.camera).unwrap();
        assert_eq!((camera.image_width(), camera.image_height()), (320, 180));
    }

    #[test]
    fn test_demo_round_trips_through_json() {
        let demo = SceneDescription::demo();
        let json = serde_json::to_string_pretty(&demo).unwrap();
        assert_eq!(SceneDescription::from_json(&json).unwrap(), demo);
    }
}
