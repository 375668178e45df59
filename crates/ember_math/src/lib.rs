// Re-export glam for convenience
pub use glam::*;

// Ember math types
mod interval;
mod ray;
pub mod vector;

pub use interval::Interval;
pub use ray::Ray;
pub use vector::{near_zero, reflect, refract, safe_normalize, EPSILON};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_creation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }

    #[test]
    fn test_vec3_componentwise_multiply() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(0.5, 0.25, 2.0);
        assert_eq!(a * b, Vec3::new(0.5, 0.5, 6.0));
        assert_eq!((a * b).max_element(), 6.0);
    }
}
