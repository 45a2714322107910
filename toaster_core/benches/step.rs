use std::time::Duration;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use toaster_core::mocks::{NoopHeater, NoopSensor};
use toaster_core::{
    CompletionCfg, ControlCfg, Model, ModelCfg, Phase, PhaseCfg, PowerLevel, Timeouts,
    build_toaster,
};
use toaster_traits::{ColorSample, Lab, ManualClock};

// Baseline trajectory with a slow deterministic wobble so the controller
// takes every branch.
fn synth_trace(n: usize, wobble: f64) -> Vec<u32> {
    let model = Model::new(ModelCfg::default(), 285.0);
    (0..n)
        .map(|i| {
            let t = i as f64;
            let r = model.expected(Phase::Goldening, PowerLevel::Baseline, t, None)
                + wobble * (t / 17.0).sin();
            r.max(0.0).round() as u32
        })
        .collect()
}

fn sample(r: u32) -> ColorSample {
    ColorSample {
        ambient: 400,
        red: r,
        green: 120,
        blue: 90,
        lab: Lab::default(),
    }
}

pub fn bench_step(c: &mut Criterion) {
    let mut g = c.benchmark_group("step");
    // Allow quick tweaking without CLI flags (Criterion 0.5):
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p toaster_core --bench step
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(Duration::from_millis(ms_u64));
    }

    let n = 600usize;
    for &wobble in &[0.0f64, 8.0, 20.0] {
        let trace = synth_trace(n, wobble);
        g.bench_function(format!("run_{n}_wobble_{wobble}"), |b| {
            b.iter_batched(
                || {
                    let clock = ManualClock::new();
                    let mut t = build_toaster(
                        NoopSensor,
                        NoopHeater,
                        ModelCfg::default(),
                        ControlCfg::default(),
                        PhaseCfg::default(),
                        CompletionCfg::default(),
                        Timeouts::default(),
                        Some(120),
                        Some(Box::new(clock.clone())),
                    )
                    .unwrap();
                    t.begin().unwrap();
                    (t, clock)
                },
                |(mut t, clock)| {
                    for &r in &trace {
                        clock.advance(Duration::from_secs(1));
                        let s = t.step_from_sample(black_box(sample(r))).unwrap();
                        black_box(s);
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    g.finish();
}

criterion_group!(step, bench_step);
criterion_main!(step);
