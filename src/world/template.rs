//! Shared obstacle templates and the pool of placed visual instances.

use crate::{InstanceId, TemplateId};
use slotmap::SlotMap;

/// The kind of an obstacle populating a track segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObstacleKind {
    /// A small hazard strewn across the road.
    Rock,
    /// A crash barrier along the track edge.
    Barrier,
    /// A decorative marker post; still solid.
    Post,
}

/// Shared immutable geometry and material data for one obstacle kind.
///
/// Templates are created once and handed out by ID; obstacle instances
/// never clone them.
#[derive(Clone, Debug)]
pub struct Template {
    /// The kind this template renders.
    pub kind: ObstacleKind,
    /// Half extents of the collision box in the ground plane, in m.
    pub half_extents: (f64, f64),
    /// Height of the visual mesh in m.
    pub height: f64,
}

/// A visual instance placed in the world, owned by one segment's content.
#[derive(Clone, Copy, Debug)]
pub struct Instance {
    /// The shared template the instance renders.
    pub template: TemplateId,
    /// World position of the instance centre in the ground plane.
    pub position: (f64, f64),
}

/// Arena of shared templates plus the pool of per-obstacle instances.
pub struct TemplateStore {
    templates: SlotMap<TemplateId, Template>,
    instances: SlotMap<InstanceId, Instance>,
}

impl TemplateStore {
    pub(crate) fn new() -> Self {
        Self {
            templates: SlotMap::with_key(),
            instances: SlotMap::with_key(),
        }
    }

    /// Registers a shared template and returns its ID.
    pub(crate) fn add_template(&mut self, template: Template) -> TemplateId {
        self.templates.insert(template)
    }

    /// Gets a template by ID.
    pub fn template(&self, id: TemplateId) -> &Template {
        &self.templates[id]
    }

    /// Places a visual instance of the given template.
    pub(crate) fn spawn_instance(&mut self, template: TemplateId, x: f64, z: f64) -> InstanceId {
        self.instances.insert(Instance {
            template,
            position: (x, z),
        })
    }

    /// Releases a placed instance. Called during segment eviction.
    pub(crate) fn release_instance(&mut self, id: InstanceId) {
        self.instances.remove(id);
    }

    /// The number of instances currently placed.
    pub fn live_instances(&self) -> usize {
        self.instances.len()
    }

    /// Iterates over all placed instances, for the rendering collaborator.
    pub fn iter_instances(&self) -> impl Iterator<Item = (InstanceId, &Instance)> {
        self.instances.iter()
    }
}
