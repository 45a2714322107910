//! Quick Start Example
//!
//! Runs the controller against the simulated toaster on an accelerated clock
//! and prints the run summary. `cargo run -p toaster_core --example quick_start`

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use toaster_core::{MemorySink, Model, ModelCfg, PhaseCfg, PowerLevel, Toaster};
use toaster_hardware::{SimParams, SimToaster};
use toaster_traits::ManualClock;

fn main() -> Result<(), eyre::Report> {
    let clock = ManualClock::new();
    let phase = PhaseCfg::default();
    let model = Model::new(ModelCfg::default(), phase.goldening_threshold_s);
    let ratios = phase.effectiveness;

    let sim = SimToaster::new(
        Arc::new(clock.clone()),
        Box::new(move |p: u8| PowerLevel::from_percent(p).map_or(0.0, |p| ratios.ratio(p))),
    );
    let (sensor, heater) = sim.devices(
        Box::new(move |t: f64| model.baseline_profile(t)),
        SimParams::default(),
    );

    let mut toaster = Toaster::builder()
        .with_sensor(sensor)
        .with_heater(heater)
        .with_phase(phase)
        .with_target(Some(185))
        .with_clock(Box::new(clock))
        .build()?;

    let mut sink = MemorySink::default();
    let summary = toaster.run(&mut sink, &AtomicBool::new(false))?;

    println!(
        "{}: {:.1}s elapsed, {} readings, last R {:?}",
        summary.outcome.as_str(),
        summary.elapsed_s,
        sink.records.len(),
        summary.last_r
    );
    Ok(())
}
