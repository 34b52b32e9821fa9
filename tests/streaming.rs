//! Long-drive streaming and resource lifecycle tests.

use drive_sim::{KindParams, ObstacleKind, Simulation, SimulationConfig, WorldConfig};

/// A world whose obstacles line the track edges, leaving the racing
/// line clear so the vehicle can drive straight indefinitely.
fn barrier_world(seed: u64) -> WorldConfig {
    WorldConfig {
        kinds: vec![KindParams {
            kind: ObstacleKind::Barrier,
            min_count: 1,
            max_count: 2,
            half_extents: (0.4, 3.0),
            height: 1.0,
        }],
        seed,
        ..Default::default()
    }
}

/// Test that the streamed window follows the vehicle over a long drive
/// and that every obstacle stays tagged within it.
#[test]
fn window_follows_the_vehicle() {
    let config = SimulationConfig {
        world: barrier_world(21),
        ..Default::default()
    };
    let mut sim = Simulation::new(config).unwrap();
    sim.set_inputs(1.0, 0.0, 0.0, false, true);

    for frame in 0..20_000 {
        sim.step(1.0 / 60.0).unwrap();
        if frame % 60 != 0 {
            continue;
        }
        let current = sim.world().current_segment().unwrap();
        for obstacle in sim.world().obstacles() {
            assert!(
                (current - 2..=current + 2).contains(&obstacle.segment),
                "obstacle tagged {} outside window around {}",
                obstacle.segment,
                current
            );
        }
    }

    // The drive actually covered a lot of track.
    let travelled = sim.vehicle().position().z;
    assert!(travelled > 3000.0);
    assert!(sim.world().current_segment().unwrap() > 40);
}

/// Test that eviction disposes visual instances in the same tick, so
/// the pool stays bounded no matter how far the vehicle travels.
#[test]
fn streaming_never_leaks_instances() {
    let config = SimulationConfig {
        world: barrier_world(5),
        ..Default::default()
    };
    let mut sim = Simulation::new(config).unwrap();
    sim.set_inputs(1.0, 0.0, 0.0, false, true);

    let mut peak = 0;
    for _ in 0..20_000 {
        sim.step(1.0 / 60.0).unwrap();
        let live = sim.world().live_instances();
        let catalogued = sim.world().obstacles().count();
        assert_eq!(live, catalogued);
        peak = peak.max(live);
    }

    // Five segments at most can be live, each with at most two barrier
    // pairs.
    assert!(peak > 0);
    assert!(peak <= 5 * 4);
}

/// Test that evicted segments' obstacles are no longer reachable from
/// the catalog.
#[test]
fn evicted_obstacles_are_unreachable() {
    let config = SimulationConfig {
        world: barrier_world(13),
        ..Default::default()
    };
    let mut sim = Simulation::new(config).unwrap();
    sim.set_inputs(1.0, 0.0, 0.0, false, false);

    let mut seen_segments = Vec::new();
    for _ in 0..30_000 {
        sim.step(1.0 / 60.0).unwrap();
        let current = sim.world().current_segment().unwrap();
        if seen_segments.last() != Some(&current) {
            seen_segments.push(current);
        }
    }
    assert!(seen_segments.len() > 10);

    let current = sim.world().current_segment().unwrap();
    for old in seen_segments.iter().filter(|s| **s < current - 2) {
        assert!(sim.world().segment(*old).is_none());
        assert!(sim.world().obstacles().all(|o| o.segment != *old));
    }
}
