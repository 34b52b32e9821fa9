//! Static-obstacle collision resolution.

use crate::math::{Point3d, Vector3d};
use crate::util::{Aabb, Interval};
use crate::world::Obstacle;

/// The fraction of the impact-axis velocity retained (and inverted) by a bounce.
const RESTITUTION: f64 = 0.2;

/// Builds the car's bounding box from its position and half extents.
pub fn car_aabb(position: Point3d, half_extents: (f64, f64)) -> Aabb {
    Aabb::from_centre(position.x, position.z, half_extents)
}

/// Resolves overlaps between the car and each obstacle, in catalog order.
///
/// Each overlapping obstacle is pushed out of independently along its axis
/// of smallest penetration, and the velocity component on that axis is
/// inverted and damped. Obstacles later in the catalog see the corrected
/// position left by earlier ones; overlaps are never solved simultaneously.
///
/// Returns true if any obstacle was resolved. After the call, the car no
/// longer penetrates the last obstacle resolved along its push axis.
pub fn resolve<'a, I>(
    position: &mut Point3d,
    velocity: &mut Vector3d,
    half_extents: (f64, f64),
    obstacles: I,
) -> bool
where
    I: IntoIterator<Item = &'a Obstacle>,
{
    let mut collided = false;
    for obstacle in obstacles {
        collided |= resolve_one(position, velocity, half_extents, obstacle);
    }
    collided
}

/// Resolves a single obstacle against the car box rebuilt at the
/// car's current (possibly already corrected) position.
fn resolve_one(
    position: &mut Point3d,
    velocity: &mut Vector3d,
    half_extents: (f64, f64),
    obstacle: &Obstacle,
) -> bool {
    let car_x = Interval::disc(position.x, half_extents.0);
    let car_z = Interval::disc(position.z, half_extents.1);
    let penetration_x = -car_x.clearance_with(&obstacle.aabb.x);
    let penetration_z = -car_z.clearance_with(&obstacle.aabb.z);
    if penetration_x <= 0.0 || penetration_z <= 0.0 {
        return false;
    }

    let (centre_x, centre_z) = obstacle.aabb.centre();
    if penetration_x <= penetration_z {
        let direction = if position.x < centre_x { -1.0 } else { 1.0 };
        position.x += direction * penetration_x;
        velocity.x = -velocity.x * RESTITUTION;
    } else {
        let direction = if position.z < centre_z { -1.0 } else { 1.0 };
        position.z += direction * penetration_z;
        velocity.z = -velocity.z * RESTITUTION;
    }
    true
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::world::ObstacleKind;
    use crate::{InstanceId, TemplateId};
    use assert_approx_eq::assert_approx_eq;
    use slotmap::Key;

    fn obstacle(x: f64, z: f64, half_extents: (f64, f64)) -> Obstacle {
        Obstacle {
            aabb: Aabb::from_centre(x, z, half_extents),
            segment: 0,
            kind: ObstacleKind::Rock,
            template: TemplateId::null(),
            instance: InstanceId::null(),
        }
    }

    #[test]
    fn pushes_out_along_smaller_penetration() {
        // Penetration 0.3 on x, 0.5 on z: resolve along x.
        let mut position = Point3d::new(0.0, 0.0, 0.0);
        let mut velocity = Vector3d::new(2.0, 0.0, 1.0);
        let obs = obstacle(1.7, 1.5, (1.0, 1.0));
        let collided = resolve(&mut position, &mut velocity, (1.0, 1.0), [&obs]);

        assert!(collided);
        assert_approx_eq!(position.x, -0.3);
        assert_approx_eq!(position.z, 0.0);
        assert_approx_eq!(velocity.x, -0.4);
        assert_approx_eq!(velocity.z, 1.0);
    }

    #[test]
    fn separated_boxes_are_untouched() {
        let mut position = Point3d::new(0.0, 0.0, 0.0);
        let mut velocity = Vector3d::new(1.0, 0.0, 1.0);
        // Overlap on x alone is not a collision.
        let obs = obstacle(0.5, 5.0, (1.0, 1.0));
        let collided = resolve(&mut position, &mut velocity, (1.0, 1.0), [&obs]);

        assert!(!collided);
        assert_approx_eq!(position.x, 0.0);
        assert_approx_eq!(velocity.x, 1.0);
    }

    #[test]
    fn coincident_centres_push_positive() {
        let mut position = Point3d::new(0.0, 0.0, 0.0);
        let mut velocity = Vector3d::new(0.0, 0.0, 0.0);
        let obs = obstacle(0.0, 0.0, (1.0, 2.0));
        let collided = resolve(&mut position, &mut velocity, (1.0, 1.0), [&obs]);

        assert!(collided);
        // Equal centres default to the positive direction on the x-axis,
        // which has the smaller combined extent.
        assert_approx_eq!(position.x, 2.0);
        assert_approx_eq!(position.z, 0.0);
    }

    #[test]
    fn later_obstacles_see_corrected_position() {
        let mut position = Point3d::new(0.0, 0.0, 0.0);
        let mut velocity = Vector3d::new(3.0, 0.0, 0.0);
        let first = obstacle(-1.5, 0.0, (1.0, 10.0));
        let second = obstacle(1.8, 0.0, (1.0, 10.0));
        let collided = resolve(&mut position, &mut velocity, (1.0, 1.0), [&first, &second]);

        assert!(collided);
        // The first push moves the car to x = 0.5; the second then sees a
        // 0.7 overlap and pushes it back out to the left.
        assert_approx_eq!(position.x, -0.2);
        // The x velocity was inverted and damped by both resolutions.
        assert_approx_eq!(velocity.x, 3.0 * 0.2 * 0.2);
        // The car is clear of the last-resolved obstacle on the push axis.
        let car = car_aabb(position, (1.0, 1.0));
        assert!(!car.x.overlaps(&second.aabb.x));
    }

    #[test]
    fn resolution_separates_the_last_obstacle() {
        let mut position = Point3d::new(10.0, 0.0, 4.0);
        let mut velocity = Vector3d::new(0.0, 0.0, 6.0);
        let obs = obstacle(10.2, 5.5, (0.6, 0.6));
        resolve(&mut position, &mut velocity, (1.0, 2.0), [&obs]);

        let car = car_aabb(position, (1.0, 2.0));
        assert!(!car.overlaps(&obs.aabb));
        // The bounce is soft: most energy is absorbed.
        assert_approx_eq!(velocity.z, -1.2);
    }
}
