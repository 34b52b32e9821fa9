use std::time::Instant;

use drive_sim::{Simulation, SimulationConfig};

fn main() {
    let mut sim = Simulation::new(SimulationConfig::default()).unwrap();

    println!("Simulating...");
    const NUM_FRAMES: u32 = 10_000;
    let mut frame_idx: u64 = 0;
    loop {
        let start = Instant::now();
        for _ in 0..NUM_FRAMES {
            let steering = (frame_idx as f64 * 0.01).sin() * 0.3;
            let boost = frame_idx % 600 < 120;
            sim.set_inputs(1.0, 0.0, steering, false, boost);
            sim.step(1.0 / 60.0).unwrap();
            frame_idx += 1;
        }
        let frame = start.elapsed() / NUM_FRAMES;
        println!(
            "Avg. frame: {:?} --> {:.0} m travelled, {} obstacles live, {:.2} boost",
            frame,
            sim.vehicle().position().z,
            sim.world().obstacles().count(),
            sim.vehicle().boost_charge(),
        );
    }
}
