pub use cgmath;
pub use error::{ConfigError, StepError};
pub use simulation::{Simulation, SimulationConfig};
use slotmap::new_key_type;
pub use slotmap::{Key, KeyData};
pub use util::{Aabb, Interval};
pub use vehicle::{BoostConfig, BoostOverrides, Vehicle, VehicleConfig};
pub use world::{
    Instance, KindParams, Obstacle, ObstacleKind, Segment, Template, TemplateStore, World,
    WorldConfig,
};

pub mod collision;
mod debug;
mod error;
pub mod math;
mod simulation;
mod util;
mod vehicle;
mod world;

new_key_type! {
    /// Unique ID of a shared obstacle [Template].
    pub struct TemplateId;
    /// Unique ID of a placed visual [Instance].
    pub struct InstanceId;
}
