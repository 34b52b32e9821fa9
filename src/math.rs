//! Mathematical structs and functions.

use cgmath::{Point3, Vector3};

/// A 3D point
pub type Point3d = Point3<f64>;

/// A 3D vector
pub type Vector3d = Vector3<f64>;

/// Linearly interpolates between `a` and `b`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Computes the unit direction vector in the ground plane for the given
/// heading in radians, where a heading of zero points along the positive z-axis.
pub fn heading_vector(heading: f64) -> Vector3d {
    Vector3d::new(heading.sin(), 0.0, heading.cos())
}
