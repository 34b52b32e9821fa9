use crate::collision;
use crate::debug::{debug_aabb, debug_impact, debug_vehicle};
#[cfg(feature = "debug")]
use crate::debug::take_debug_frame;
use crate::error::{check_positive, ConfigError, StepError};
use crate::math::Point3d;
use crate::vehicle::{Vehicle, VehicleConfig};
use crate::world::{World, WorldConfig};
use arrayvec::ArrayVec;
use cgmath::prelude::*;

/// The longest raw frame delta accepted, in s.
/// Longer hitches are clamped so physics cannot explode.
const MAX_FRAME_DT: f64 = 0.1; // s

/// The number of recent frame deltas averaged for smoothing.
const DT_WINDOW: usize = 5;

/// The configuration of a simulation.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    /// The vehicle tuning parameters.
    pub vehicle: VehicleConfig,
    /// The world streamer parameters.
    pub world: WorldConfig,
    /// Collision half extents of the car in the ground plane, in m.
    pub collider_half_extents: (f64, f64),
    /// The spawn position.
    pub spawn_position: Point3d,
    /// The spawn heading in radians; zero faces the positive z-axis.
    pub spawn_heading: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            vehicle: VehicleConfig::default(),
            world: WorldConfig::default(),
            collider_half_extents: (1.0, 2.2),
            spawn_position: Point3d::new(0.0, 0.0, 0.0),
            spawn_heading: 0.0,
        }
    }
}

/// A driving simulation.
///
/// The single authoritative per-frame driver: smooths the frame delta,
/// steps the vehicle dynamics, resolves collisions against the streamed
/// obstacle catalog, advances the world streamer and clamps the vehicle
/// to the track's lateral bounds. All state is owned and mutated here;
/// a multi-threaded host must marshal calls onto one thread.
pub struct Simulation {
    /// The simulated vehicle.
    vehicle: Vehicle,
    /// The streamed world around it.
    world: World,
    /// Collision half extents of the car in m.
    collider_half_extents: (f64, f64),
    /// Where resets teleport the vehicle back to.
    spawn_position: Point3d,
    /// The heading restored by a reset.
    spawn_heading: f64,
    /// Recent clamped frame deltas, most recent last.
    dt_samples: ArrayVec<f64, DT_WINDOW>,
    /// The impact magnitude of the most recent tick, if it collided.
    last_impact: Option<f64>,
    /// Whether a reset was requested for the current tick.
    reset_requested: bool,
    /// Cleared by [stop](Self::stop); checked at the top of each tick.
    running: bool,
    /// Debugging information from the previously simulated frame.
    #[cfg(feature = "debug")]
    debug: serde_json::Value,
}

impl Simulation {
    /// Creates a new simulation, validating the whole configuration.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        check_positive("collider half extent", config.collider_half_extents.0)?;
        check_positive("collider half extent", config.collider_half_extents.1)?;
        let vehicle = Vehicle::new(config.vehicle, config.spawn_position, config.spawn_heading)?;
        let world = World::new(config.world)?;
        Ok(Self {
            vehicle,
            world,
            collider_half_extents: config.collider_half_extents,
            spawn_position: config.spawn_position,
            spawn_heading: config.spawn_heading,
            dt_samples: ArrayVec::new(),
            last_impact: None,
            reset_requested: false,
            running: true,
            #[cfg(feature = "debug")]
            debug: serde_json::Value::Null,
        })
    }

    /// Supplies the driver inputs for the next tick.
    /// Out-of-range values are clamped, never rejected.
    pub fn set_inputs(
        &mut self,
        throttle: f64,
        brake: f64,
        steering: f64,
        handbrake: bool,
        boost: bool,
    ) {
        self.vehicle
            .set_inputs(throttle, brake, steering, handbrake, boost);
    }

    /// Requests a teleport back to spawn at the end of the next tick.
    pub fn request_reset(&mut self) {
        self.reset_requested = true;
    }

    /// Stops the simulation; subsequent ticks become no-ops.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Whether the simulation is still running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advances the simulation by one frame.
    ///
    /// `raw_dt` is the raw elapsed time since the previous frame in
    /// seconds; it is clamped and smoothed before integration. Returns
    /// an error if the vehicle state stops being finite, which callers
    /// must treat as fatal.
    pub fn step(&mut self, raw_dt: f64) -> Result<(), StepError> {
        if !self.running {
            return Ok(());
        }
        self.last_impact = None;

        let dt = self.smooth_dt(raw_dt);
        self.vehicle.step(dt);
        self.resolve_collisions();
        self.world.update(self.vehicle.position().z);
        self.clamp_lateral();
        if self.reset_requested {
            self.reset_requested = false;
            self.vehicle.reset(self.spawn_position, self.spawn_heading);
        }
        self.check_finite()?;

        debug_vehicle(
            self.vehicle.position(),
            self.vehicle.heading(),
            self.vehicle.velocity(),
        );
        #[cfg(feature = "debug")]
        {
            self.debug = take_debug_frame();
        }
        Ok(())
    }

    /// Clamps the raw frame delta and folds it into the rolling average.
    fn smooth_dt(&mut self, raw_dt: f64) -> f64 {
        let clamped = raw_dt.clamp(0.0, MAX_FRAME_DT);
        if self.dt_samples.is_full() {
            self.dt_samples.remove(0);
        }
        self.dt_samples.push(clamped);
        let sum: f64 = self.dt_samples.iter().sum();
        sum / self.dt_samples.len() as f64
    }

    /// Resolves the car against the obstacle catalog and records the
    /// impact magnitude from the velocity change.
    fn resolve_collisions(&mut self) {
        let before = self.vehicle.velocity();
        let half_extents = self.collider_half_extents;
        let (position, velocity) = self.vehicle.pose_mut();
        let collided = collision::resolve(position, velocity, half_extents, self.world.obstacles());
        if collided {
            let impact = (self.vehicle.velocity() - before).magnitude();
            debug_aabb(
                "car",
                &collision::car_aabb(self.vehicle.position(), half_extents),
            );
            debug_impact(impact);
            self.last_impact = Some(impact);
        }
    }

    /// Clamps the vehicle to the track's lateral bounds.
    /// The forward axis is unbounded.
    fn clamp_lateral(&mut self) {
        let half_width = self.world.config().track_half_width;
        let position = self.vehicle.position_mut();
        position.x = position.x.clamp(-half_width, half_width);
    }

    /// Treats any non-finite component of the vehicle state as a fatal
    /// invariant violation.
    fn check_finite(&self) -> Result<(), StepError> {
        let position = self.vehicle.position();
        let velocity = self.vehicle.velocity();
        let finite = position.x.is_finite()
            && position.y.is_finite()
            && position.z.is_finite()
            && velocity.x.is_finite()
            && velocity.y.is_finite()
            && velocity.z.is_finite();
        if finite {
            Ok(())
        } else {
            let error = StepError::NonFinite {
                position: [position.x, position.y, position.z],
                velocity: [velocity.x, velocity.y, velocity.z],
            };
            log::error!("{}", error);
            Err(error)
        }
    }

    /// The simulated vehicle.
    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    /// The streamed world around the vehicle.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The impact magnitude of the most recent tick, if it collided.
    /// The magnitude is the length of the velocity change applied by
    /// the collision resolver.
    pub fn last_impact(&self) -> Option<f64> {
        self.last_impact
    }

    /// Gets the debugging information for the previously simulated frame.
    #[cfg(feature = "debug")]
    pub fn debug(&mut self) -> serde_json::Value {
        self.debug.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn frame_hitches_are_clamped() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        sim.set_inputs(1.0, 0.0, 0.0, false, false);
        // A two-second hitch advances the vehicle by at most one clamped step.
        sim.step(2.0).unwrap();
        let travelled = sim.vehicle().position().z;
        let max_travel = sim.vehicle().config().max_speed * MAX_FRAME_DT;
        assert!(travelled <= max_travel + 1e-9);
    }

    #[test]
    fn dt_smoothing_averages_recent_frames() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        for _ in 0..DT_WINDOW {
            sim.step(0.02).unwrap();
        }
        // A single spike is diluted by the rolling window.
        let smoothed = sim.smooth_dt(0.1);
        assert_approx_eq!(smoothed, (0.02 * 4.0 + 0.1) / 5.0);
    }

    #[test]
    fn reset_returns_to_spawn_but_keeps_boost_charge() {
        let config = SimulationConfig {
            world: WorldConfig {
                kinds: vec![],
                ..Default::default()
            },
            ..Default::default()
        };
        let mut sim = Simulation::new(config).unwrap();
        sim.set_inputs(1.0, 0.0, 0.3, false, true);
        for _ in 0..180 {
            sim.step(1.0 / 60.0).unwrap();
        }
        assert!(sim.vehicle().position().z > 1.0);
        let charge = sim.vehicle().boost_charge();
        assert!(charge < 0.9);

        sim.set_inputs(0.0, 0.0, 0.0, false, false);
        sim.request_reset();
        sim.step(1.0 / 60.0).unwrap();

        let position = sim.vehicle().position();
        assert_approx_eq!(position.x, 0.0);
        assert_approx_eq!(position.z, 0.0);
        assert_approx_eq!(sim.vehicle().speed(), 0.0);
        // Charge was not refilled by the reset.
        assert!(sim.vehicle().boost_charge() < charge + 0.01);
    }

    #[test]
    fn stopped_simulation_ignores_ticks() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        sim.set_inputs(1.0, 0.0, 0.0, false, false);
        sim.stop();
        assert!(!sim.is_running());
        sim.step(1.0 / 60.0).unwrap();
        assert_approx_eq!(sim.vehicle().position().z, 0.0);
    }

    #[test]
    fn non_finite_state_is_fatal() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        sim.set_inputs(1.0, 0.0, 0.0, false, false);
        let result = sim.step(f64::NAN);
        assert!(matches!(result, Err(StepError::NonFinite { .. })));
    }

    #[test]
    fn bad_collider_extents_are_rejected() {
        let config = SimulationConfig {
            collider_half_extents: (0.0, 2.0),
            ..Default::default()
        };
        assert!(matches!(
            Simulation::new(config),
            Err(ConfigError::NonPositive { .. })
        ));
    }
}
