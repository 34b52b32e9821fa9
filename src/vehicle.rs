use crate::error::ConfigError;
use crate::math::{heading_vector, lerp, Point3d, Vector3d};
use cgmath::prelude::*;

pub use config::{BoostConfig, BoostOverrides, VehicleConfig};

mod config;

/// The minimum throttle required for boost to engage.
const BOOST_THROTTLE_MIN: f64 = 0.05;

/// Boost charge below this is treated as empty.
const BOOST_CHARGE_MIN: f64 = 1e-3;

/// Forward speeds above this are braked; below it the brake reverses, in m/s.
const BRAKE_REVERSE_THRESHOLD: f64 = 0.2; // m/s

/// The fraction of steering authority retained at top speed.
const HIGH_SPEED_STEER: f64 = 0.45;

/// A simulated vehicle.
///
/// Owns the vehicle's kinematic state and advances it each tick from the
/// clamped driver inputs. Collision response happens elsewhere; the
/// resolver mutates [velocity](Self::velocity_mut) in place between ticks.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// The immutable tuning parameters.
    config: VehicleConfig,
    /// World position of the centre of the vehicle. Y stays on the ground plane.
    position: Point3d,
    /// The heading in radians; zero points along the positive z-axis.
    heading: f64,
    /// The velocity in m/s.
    velocity: Vector3d,
    /// The throttle input in [0, 1].
    throttle: f64,
    /// The brake input in [0, 1].
    brake: f64,
    /// The steering input in [-1, 1].
    steering: f64,
    /// Whether the handbrake is held.
    handbrake: bool,
    /// Whether boost is requested.
    boost_input: bool,
    /// The normalised boost charge in [0, 1].
    boost_charge: f64,
    /// Whether boost was engaged during the last step.
    boost_active: bool,
}

impl Vehicle {
    /// Creates a new vehicle at the given spawn position and heading,
    /// validating the configuration.
    pub fn new(
        config: VehicleConfig,
        position: Point3d,
        heading: f64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            position,
            heading,
            velocity: Vector3d::new(0.0, 0.0, 0.0),
            throttle: 0.0,
            brake: 0.0,
            steering: 0.0,
            handbrake: false,
            boost_input: false,
            boost_charge: 1.0,
            boost_active: false,
        })
    }

    /// Supplies the driver inputs for the next step.
    /// Out-of-range values are clamped, never rejected.
    pub fn set_inputs(
        &mut self,
        throttle: f64,
        brake: f64,
        steering: f64,
        handbrake: bool,
        boost: bool,
    ) {
        self.throttle = throttle.clamp(0.0, 1.0);
        self.brake = brake.clamp(0.0, 1.0);
        self.steering = steering.clamp(-1.0, 1.0);
        self.handbrake = handbrake;
        self.boost_input = boost;
    }

    /// Advances the vehicle state by `dt` seconds.
    /// A non-positive `dt` is a no-op.
    pub fn step(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        self.update_boost(dt);
        self.integrate_heading(dt);
        self.apply_forces(dt);
        self.clamp_speed();
        self.position += self.velocity * dt;
    }

    /// Drains or regenerates the boost charge and latches whether
    /// boost is engaged for this step.
    fn update_boost(&mut self, dt: f64) {
        let engaged = self.boost_input
            && self.throttle > BOOST_THROTTLE_MIN
            && !self.handbrake
            && self.boost_charge > BOOST_CHARGE_MIN;
        let boost = &self.config.boost;
        if engaged {
            self.boost_charge = (self.boost_charge - boost.drain * dt).max(0.0);
        } else {
            self.boost_charge = (self.boost_charge + boost.regen * dt).min(1.0);
        }
        self.boost_active = engaged;
    }

    /// Integrates the heading from the steering input.
    /// Steering authority is attenuated as speed rises.
    fn integrate_heading(&mut self, dt: f64) {
        let speed_ratio = (self.velocity.magnitude() / self.config.max_speed).min(1.0);
        let authority = lerp(1.0, HIGH_SPEED_STEER, speed_ratio);
        let turn_rate =
            self.steering * authority * self.config.handling * (0.5 + 0.5 * speed_ratio);
        self.heading += turn_rate * dt;
    }

    /// Decomposes the velocity into forward and lateral components,
    /// applies throttle, braking, lateral grip and drag, and recombines.
    fn apply_forces(&mut self, dt: f64) {
        let config = &self.config;
        let forward = heading_vector(self.heading);
        let mut forward_speed = self.velocity.dot(forward);
        let mut lateral = self.velocity - forward * forward_speed;

        let acceleration = if self.boost_active {
            config.acceleration * config.boost.multiplier
        } else {
            config.acceleration
        };
        forward_speed += acceleration * self.throttle * dt;

        if self.brake > 0.0 {
            if forward_speed > BRAKE_REVERSE_THRESHOLD {
                // Braking never reverses the direction of travel on its own.
                forward_speed = (forward_speed - config.braking * self.brake * dt).max(0.0);
            } else {
                let max_reverse = config.max_speed * config.reverse_scale;
                forward_speed = (forward_speed
                    - config.acceleration * config.reverse_scale * self.brake * dt)
                    .max(-max_reverse);
            }
        }

        // The handbrake reduces grip, letting the rear slide out.
        let grip = config.lateral_grip
            * if self.handbrake {
                config.handbrake_grip
            } else {
                1.0
            };
        lateral *= (1.0 - grip * dt).max(0.0);

        self.velocity = forward * forward_speed + lateral;
        self.velocity *= (1.0 - config.drag * dt).max(0.0);
    }

    /// Clamps the velocity to the forward and reverse speed limits.
    fn clamp_speed(&mut self) {
        let config = &self.config;
        let forward = heading_vector(self.heading);
        let forward_speed = self.velocity.dot(forward);
        if forward_speed >= 0.0 {
            let limit = config.max_speed
                * if self.boost_active {
                    config.boost.multiplier
                } else {
                    1.0
                };
            let speed = self.velocity.magnitude();
            if speed > limit {
                self.velocity *= limit / speed;
            }
        } else {
            let max_reverse = config.max_speed * config.reverse_scale;
            if -forward_speed > max_reverse {
                let lateral = self.velocity - forward * forward_speed;
                self.velocity = lateral - forward * max_reverse;
            }
        }
    }

    /// Teleports the vehicle and zeroes its velocity.
    /// Boost charge carries across resets.
    pub fn reset(&mut self, position: Point3d, heading: f64) {
        self.position = position;
        self.heading = heading;
        self.velocity = Vector3d::new(0.0, 0.0, 0.0);
    }

    /// The world position of the centre of the vehicle.
    pub fn position(&self) -> Point3d {
        self.position
    }

    /// The heading in radians; zero points along the positive z-axis.
    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// A unit vector aligned with the vehicle's heading.
    pub fn forward(&self) -> Vector3d {
        heading_vector(self.heading)
    }

    /// The velocity in m/s.
    pub fn velocity(&self) -> Vector3d {
        self.velocity
    }

    /// Mutable access to the velocity, exposed so the collision
    /// resolver can modify it in place.
    pub fn velocity_mut(&mut self) -> &mut Vector3d {
        &mut self.velocity
    }

    /// Splits out mutable references to the position and velocity
    /// for in-place collision resolution.
    pub(crate) fn pose_mut(&mut self) -> (&mut Point3d, &mut Vector3d) {
        (&mut self.position, &mut self.velocity)
    }

    /// Mutable access to the position, for the lateral bounds clamp.
    pub(crate) fn position_mut(&mut self) -> &mut Point3d {
        &mut self.position
    }

    /// The current speed in m/s.
    pub fn speed(&self) -> f64 {
        self.velocity.magnitude()
    }

    /// The signed speed along the heading; negative when reversing.
    pub fn forward_speed(&self) -> f64 {
        self.velocity.dot(self.forward())
    }

    /// The throttle input in [0, 1].
    pub fn throttle(&self) -> f64 {
        self.throttle
    }

    /// The normalised boost charge in [0, 1].
    pub fn boost_charge(&self) -> f64 {
        self.boost_charge
    }

    /// Whether boost was engaged during the last step.
    pub fn boost_active(&self) -> bool {
        self.boost_active
    }

    /// The vehicle's tuning parameters.
    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }
}
