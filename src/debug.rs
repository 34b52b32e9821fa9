use crate::math::{Point3d, Vector3d};
use crate::util::Aabb;
#[cfg(feature = "debug")]
use serde_json::json;

#[cfg(feature = "debug")]
thread_local!(
    static DEBUG_FRAME: std::cell::RefCell<Vec<serde_json::Value>> = Default::default();
);

#[allow(unused)]
pub fn debug_vehicle(position: Point3d, heading: f64, velocity: Vector3d) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.with(|frame| {
        frame.borrow_mut().push(json!({
            "type": "vehicle",
            "position": [position.x, position.y, position.z],
            "heading": heading,
            "velocity": [velocity.x, velocity.y, velocity.z],
        }))
    })
}

#[allow(unused)]
pub fn debug_aabb(name: &str, aabb: &Aabb) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.with(|frame| {
        frame.borrow_mut().push(json!({
            "type": "aabb",
            "name": name,
            "x": [aabb.x.min, aabb.x.max],
            "z": [aabb.z.min, aabb.z.max],
        }))
    })
}

#[allow(unused)]
pub fn debug_impact(magnitude: f64) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.with(|frame| {
        frame.borrow_mut().push(json!({
            "type": "impact",
            "magnitude": magnitude,
        }))
    })
}

#[cfg(feature = "debug")]
pub fn take_debug_frame() -> serde_json::Value {
    json!(DEBUG_FRAME.with(|frame| frame.take()))
}
