use std::collections::HashMap;

use crate::error::{check_positive, ConfigError};
use crate::util::{Aabb, Interval};
use crate::{InstanceId, TemplateId};
use itertools::{iproduct, Itertools};
use once_cell::sync::Lazy;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use smallvec::SmallVec;

pub use template::{Instance, ObstacleKind, Template, TemplateStore};

mod template;

/// Number of segments kept generated ahead of the vehicle.
const LOOKAHEAD_SEGMENTS: i64 = 2;

/// Segments further than this behind the vehicle are evicted.
const EVICT_BEHIND_SEGMENTS: i64 = 2;

/// The lateral placement spread of scattered obstacles,
/// as a fraction of the track half width.
const SCATTER_SPREAD: f64 = 0.4;

/// The stock obstacle population.
static DEFAULT_KINDS: Lazy<Vec<KindParams>> = Lazy::new(|| {
    vec![
        KindParams {
            kind: ObstacleKind::Rock,
            min_count: 2,
            max_count: 5,
            half_extents: (0.6, 0.6),
            height: 0.5,
        },
        KindParams {
            kind: ObstacleKind::Barrier,
            min_count: 0,
            max_count: 2,
            half_extents: (0.4, 3.0),
            height: 1.0,
        },
        KindParams {
            kind: ObstacleKind::Post,
            min_count: 1,
            max_count: 4,
            half_extents: (0.25, 0.25),
            height: 1.2,
        },
    ]
});

/// Per-kind generation parameters.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KindParams {
    /// The obstacle kind being generated.
    pub kind: ObstacleKind,
    /// The minimum number generated per segment.
    pub min_count: u32,
    /// The maximum number generated per segment, inclusive.
    pub max_count: u32,
    /// Half extents of the collision box in the ground plane, in m.
    pub half_extents: (f64, f64),
    /// Height of the visual mesh in m.
    pub height: f64,
}

/// The world streamer's tuning parameters.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldConfig {
    /// Length of one track segment in m.
    pub segment_length: f64,
    /// Half the drivable width of the track in m.
    pub track_half_width: f64,
    /// Generation parameters per obstacle kind.
    pub kinds: Vec<KindParams>,
    /// Seed for the procedural generator.
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            segment_length: 60.0,
            track_half_width: 12.0,
            kinds: DEFAULT_KINDS.clone(),
            seed: 0,
        }
    }
}

impl WorldConfig {
    /// Checks the configuration, failing fast on values that would
    /// produce a degenerate world.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("segment_length", self.segment_length)?;
        check_positive("track_half_width", self.track_half_width)?;
        for params in &self.kinds {
            check_positive("obstacle half extent", params.half_extents.0)?;
            check_positive("obstacle half extent", params.half_extents.1)?;
            if params.min_count > params.max_count {
                return Err(ConfigError::InvertedCountRange {
                    kind: params.kind,
                    min: params.min_count,
                    max: params.max_count,
                });
            }
            if params.half_extents.0 >= self.track_half_width {
                return Err(ConfigError::KindTooWide { kind: params.kind });
            }
        }
        Ok(())
    }
}

/// A static obstacle occupying part of the track.
#[derive(Clone, Copy, Debug)]
pub struct Obstacle {
    /// The collision box in the ground plane.
    pub aabb: Aabb,
    /// Index of the segment that generated the obstacle.
    pub segment: i64,
    /// The obstacle kind.
    pub kind: ObstacleKind,
    /// The shared template the obstacle was stamped from.
    pub template: TemplateId,
    /// The visual instance owned by the obstacle.
    pub instance: InstanceId,
}

/// A fixed-length stretch of track and the content generated for it.
pub struct Segment {
    /// The signed segment index.
    index: i64,
    /// The obstacles generated for this segment.
    obstacles: Vec<Obstacle>,
    /// The visual instances owned by this segment's content.
    instances: SmallVec<[InstanceId; 16]>,
}

impl Segment {
    /// The signed segment index.
    pub fn index(&self) -> i64 {
        self.index
    }

    /// The obstacles generated for this segment.
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Releases the segment's visual instances back to the pool.
    /// Returns the number of instances released.
    fn release(&mut self, store: &mut TemplateStore) -> usize {
        let released = self.instances.len();
        for id in self.instances.drain(..) {
            store.release_instance(id);
        }
        self.obstacles.clear();
        released
    }
}

/// Streams track content around the vehicle.
///
/// The forward travel axis is partitioned into fixed-length segments,
/// keyed by signed index in a sparse map. Segments are generated up to
/// two ahead of the vehicle and evicted, together with their obstacles
/// and visual instances, once they fall more than two behind.
pub struct World {
    /// The streamer's tuning parameters.
    config: WorldConfig,
    /// The materialized segments, keyed by signed segment index.
    segments: HashMap<i64, Segment>,
    /// Shared templates and the live instance pool.
    store: TemplateStore,
    /// Template IDs in the same order as `config.kinds`.
    kind_templates: Vec<TemplateId>,
    /// The procedural generator state.
    rng: StdRng,
    /// Lateral placement jitter for scattered obstacles.
    jitter: Normal<f64>,
    /// The segment the vehicle most recently occupied.
    current: Option<i64>,
}

impl World {
    /// Creates a new world streamer, validating the configuration.
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut store = TemplateStore::new();
        let kind_templates = config
            .kinds
            .iter()
            .map(|params| {
                store.add_template(Template {
                    kind: params.kind,
                    half_extents: params.half_extents,
                    height: params.height,
                })
            })
            .collect();
        let jitter = Normal::new(0.0, SCATTER_SPREAD * config.track_half_width)
            .expect("Invalid placement deviation");
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            segments: HashMap::new(),
            store,
            kind_templates,
            jitter,
            current: None,
            config,
        })
    }

    /// The segment index containing the given forward position.
    pub fn segment_index(&self, position: f64) -> i64 {
        (position / self.config.segment_length).floor() as i64
    }

    /// The travel-axis interval covered by the given segment.
    pub fn segment_interval(&self, index: i64) -> Interval<f64> {
        let length = self.config.segment_length;
        Interval::new(index as f64 * length, (index + 1) as f64 * length)
    }

    /// Updates the streamed window around the vehicle's forward position.
    ///
    /// Generates any missing segments up to the look-ahead bound and
    /// evicts segments that left the window, releasing their resources
    /// before returning. Repeated calls within one segment do nothing.
    pub fn update(&mut self, position: f64) {
        let index = self.segment_index(position);
        if self.current == Some(index) {
            return;
        }
        self.current = Some(index);
        for idx in index..=index + LOOKAHEAD_SEGMENTS {
            if !self.segments.contains_key(&idx) {
                self.generate(idx);
            }
        }
        self.evict(index);
    }

    /// Generates the content of one segment.
    fn generate(&mut self, index: i64) {
        let interval = self.segment_interval(index);
        let mut obstacles = Vec::new();
        let mut instances = SmallVec::new();

        for (params, template) in self.config.kinds.iter().zip(&self.kind_templates) {
            let count = self.rng.gen_range(params.min_count..=params.max_count);
            let edge = self.config.track_half_width - params.half_extents.0;
            let placements: Vec<(f64, f64)> = match params.kind {
                // Barriers line both edges of the track in matched pairs.
                ObstacleKind::Barrier => {
                    let rows: Vec<f64> = (0..count)
                        .map(|_| self.rng.gen_range(interval.min..interval.max))
                        .collect();
                    iproduct!(rows, [-1.0, 1.0])
                        .map(|(z, side)| (side * edge, z))
                        .collect()
                }
                // Everything else scatters around the racing line.
                _ => (0..count)
                    .map(|_| {
                        let z = self.rng.gen_range(interval.min..interval.max);
                        let x = self.jitter.sample(&mut self.rng).clamp(-edge, edge);
                        (x, z)
                    })
                    .collect(),
            };

            for (x, z) in placements {
                let instance = self.store.spawn_instance(*template, x, z);
                instances.push(instance);
                obstacles.push(Obstacle {
                    aabb: Aabb::from_centre(x, z, params.half_extents),
                    segment: index,
                    kind: params.kind,
                    template: *template,
                    instance,
                });
            }
        }

        log::debug!("generated segment {} with {} obstacles", index, obstacles.len());
        self.segments.insert(
            index,
            Segment {
                index,
                obstacles,
                instances,
            },
        );
    }

    /// Evicts every segment outside the window around `current`,
    /// releasing its resources synchronously.
    fn evict(&mut self, current: i64) {
        let window = (current - EVICT_BEHIND_SEGMENTS)..=(current + LOOKAHEAD_SEGMENTS);
        let store = &mut self.store;
        self.segments.retain(|index, segment| {
            if window.contains(index) {
                true
            } else {
                let released = segment.release(store);
                log::debug!("evicted segment {} ({} instances released)", index, released);
                false
            }
        });
    }

    /// Iterates the live obstacle catalog in ascending segment order.
    pub fn obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.segments
            .values()
            .sorted_by_key(|segment| segment.index)
            .flat_map(|segment| segment.obstacles.iter())
    }

    /// Iterates the materialized segments in no particular order.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    /// Gets a materialized segment by index.
    pub fn segment(&self, index: i64) -> Option<&Segment> {
        self.segments.get(&index)
    }

    /// The segment the vehicle most recently occupied.
    pub fn current_segment(&self) -> Option<i64> {
        self.current
    }

    /// The number of visual instances currently placed.
    pub fn live_instances(&self) -> usize {
        self.store.live_instances()
    }

    /// The shared templates and live instances, for the rendering collaborator.
    pub fn templates(&self) -> &TemplateStore {
        &self.store
    }

    /// The streamer's tuning parameters.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }
}
