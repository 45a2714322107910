//! End-to-end control scenarios driven through `ToasterCore` with a manual clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use toaster_core::mocks::NoopSensor;
use toaster_core::{
    Action, ControlCfg, ControlMode, Model, ModelCfg, Phase, PhaseCfg, PowerLevel, Saturating,
    Toaster, ToastingStatus,
};
use toaster_traits::{ColorSample, Heater, Lab, ManualClock};

#[derive(Clone, Default)]
struct Commands(Arc<Mutex<Vec<u8>>>);

impl Commands {
    fn get(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

struct RecHeater(Commands);

impl Heater for RecHeater {
    fn set_power(&mut self, percent: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.0.0.lock().unwrap().push(percent);
        Ok(())
    }
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

fn toaster(
    clock: &ManualClock,
    cmds: &Commands,
    model: ModelCfg,
    control: ControlCfg,
    target: Option<i32>,
) -> Toaster {
    Toaster::builder()
        .with_sensor(NoopSensor)
        .with_heater(RecHeater(cmds.clone()))
        .with_model(model)
        .with_control(control)
        .with_target(target)
        .with_clock(Box::new(clock.clone()))
        .build()
        .expect("valid config")
}

fn step(t: &mut Toaster, clock: &ManualClock, r: u32) -> ToastingStatus {
    clock.advance(Duration::from_secs(1));
    t.step_from_sample(sample(r)).expect("step")
}

#[test]
fn on_model_goldening_holds_baseline() {
    let clock = ManualClock::new();
    let cmds = Commands::default();
    let mut t = toaster(
        &clock,
        &cmds,
        ModelCfg::default(),
        ControlCfg::default(),
        Some(120),
    );
    t.begin().unwrap();
    let model = Model::new(ModelCfg::default(), 285.0);

    for i in 1..=20 {
        let expected = model.expected(Phase::Goldening, PowerLevel::Baseline, f64::from(i), None);
        let status = step(&mut t, &clock, expected.round() as u32);
        let rec = status.record().expect("processed");
        assert_eq!(rec.action, Action::OnTrack, "cycle {i}");
        assert_eq!(rec.power, PowerLevel::Baseline);
        assert!(rec.valid);
    }

    assert_eq!(cmds.get(), vec![80]);
    let snap = t.snapshot();
    assert_eq!(snap.phase, Phase::Goldening);
    assert_eq!(snap.hits, 0);
    assert_eq!(snap.recent_valid.len(), 5);
    assert!((snap.effective_s - 20.0).abs() < 1e-9);
}

#[test]
fn behind_model_boosts_then_stabilizes() {
    let clock = ManualClock::new();
    let cmds = Commands::default();
    // Flat baseline goldening so every difference is exact.
    let model = ModelCfg {
        baseline_goldening: Saturating::new(0.0, 0.0, 150.0),
        ..ModelCfg::default()
    };
    let mut t = toaster(&clock, &cmds, model, ControlCfg::default(), None);
    t.begin().unwrap();

    let status = step(&mut t, &clock, 142);
    let rec = status.record().unwrap();
    match rec.action {
        Action::Increase { duration_s } => assert!((duration_s - 8.0 / 1.10401).abs() < 1e-9),
        other => panic!("expected increase, got {other:?}"),
    }
    assert_eq!(rec.action.to_string(), "Increasing power to 100% for 7.25s");
    assert_eq!(t.power(), PowerLevel::Full);

    for tick in 1..8 {
        let status = step(&mut t, &clock, 150);
        let rec = status.record().unwrap();
        assert_eq!(rec.action, Action::CompletingAdjustment, "tick {tick}");
        assert_eq!(rec.power, PowerLevel::Full);
        assert!(!rec.valid);
    }
    assert_eq!(cmds.get(), vec![80, 100]);

    step(&mut t, &clock, 150);
    assert_eq!(cmds.get(), vec![80, 100, 80]);
    assert_eq!(t.power(), PowerLevel::Baseline);
    assert_eq!(
        t.snapshot().mode,
        ControlMode::Stabilizing { time_left_s: 3.0 }
    );
}

#[test]
fn target_counting_needs_readings_needed_hits() {
    let clock = ManualClock::new();
    let cmds = Commands::default();
    // A wide deadband keeps every reading valid for control.
    let control = ControlCfg {
        deadband: 1_000.0,
        ..ControlCfg::default()
    };
    let mut t = toaster(&clock, &cmds, ModelCfg::default(), control, Some(140));
    t.begin().unwrap();
    clock.advance(Duration::from_secs(299));

    for r in [138, 141, 139, 140, 137] {
        match step(&mut t, &clock, r) {
            ToastingStatus::Running(_) => {}
            other => panic!("stopped early: {other:?}"),
        }
    }
    assert_eq!(t.phase(), Phase::Browning);
    assert_eq!(t.snapshot().hits, 4);
    assert_eq!(cmds.get(), vec![80]);

    match step(&mut t, &clock, 135) {
        // The stop row is logged at the power the reading was taken at.
        ToastingStatus::Complete(rec) => assert_eq!(rec.power, PowerLevel::Baseline),
        other => panic!("expected completion, got {other:?}"),
    }
    assert_eq!(t.snapshot().hits, 5);
    assert_eq!(t.power(), PowerLevel::Off);
    assert_eq!(cmds.get(), vec![80, 0]);
}

#[test]
fn adjusting_and_stabilizing_readings_never_count() {
    let clock = ManualClock::new();
    let cmds = Commands::default();
    let mut t = toaster(
        &clock,
        &cmds,
        ModelCfg::default(),
        ControlCfg::default(),
        Some(140),
    );
    t.begin().unwrap();
    clock.advance(Duration::from_secs(299));

    // Far behind the browning curve: the controller boosts for the full 10 s,
    // stabilizes for 3 s, and boosts again. Only the reading that ends
    // stabilization is taken at plain baseline.
    let mut valid = 0;
    for _ in 0..20 {
        let status = step(&mut t, &clock, 130);
        if status.record().unwrap().valid {
            valid += 1;
        }
    }
    assert_eq!(t.phase(), Phase::Browning);
    assert_eq!(valid, 1);
    assert_eq!(t.snapshot().hits, 1);
    assert_eq!(t.snapshot().recent_valid, vec![130]);
    assert_eq!(cmds.get(), vec![80, 100, 80, 100]);
}

#[test]
fn transition_is_stamped_with_raw_elapsed_time() {
    let clock = ManualClock::new();
    let cmds = Commands::default();
    let control = ControlCfg {
        deadband: 1_000.0,
        ..ControlCfg::default()
    };
    let mut t = toaster(&clock, &cmds, ModelCfg::default(), control, None);
    t.begin().unwrap();
    clock.advance(Duration::from_millis(285_250));
    step(&mut t, &clock, 190);
    assert_eq!(t.phase(), Phase::Browning);
    assert_eq!(t.snapshot().transition_s, Some(286.25));
}

#[test]
fn phase_estimates_follow_the_phase() {
    let clock = ManualClock::new();
    let cmds = Commands::default();
    let control = ControlCfg {
        deadband: 1_000.0,
        ..ControlCfg::default()
    };
    let mut t = toaster(&clock, &cmds, ModelCfg::default(), control, None);
    t.begin().unwrap();

    let rec = step(&mut t, &clock, 150).record().cloned().unwrap();
    assert!((rec.estimate.remaining_goldening_s - 284.0).abs() < 1e-9);
    assert_eq!(rec.estimate.remaining_browning_s, 300.0);

    clock.advance(Duration::from_secs(300));
    let rec = step(&mut t, &clock, 180).record().cloned().unwrap();
    assert_eq!(rec.estimate.remaining_goldening_s, 0.0);
    assert!((rec.estimate.remaining_browning_s - 880.466_472_303_207).abs() < 1e-6);
}

#[test]
fn phase_config_controls_the_threshold() {
    let clock = ManualClock::new();
    let cmds = Commands::default();
    let mut t = Toaster::builder()
        .with_sensor(NoopSensor)
        .with_heater(RecHeater(cmds.clone()))
        .with_control(ControlCfg {
            deadband: 1_000.0,
            ..ControlCfg::default()
        })
        .with_phase(PhaseCfg {
            goldening_threshold_s: 10.0,
            ..PhaseCfg::default()
        })
        .with_clock(Box::new(clock.clone()))
        .build()
        .unwrap();
    t.begin().unwrap();
    for _ in 0..10 {
        step(&mut t, &clock, 150);
    }
    assert_eq!(t.phase(), Phase::Goldening);
    step(&mut t, &clock, 150);
    assert_eq!(t.phase(), Phase::Browning);
}
