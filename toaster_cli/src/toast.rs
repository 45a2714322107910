//! Device assembly and the two commands that use it.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use eyre::WrapErr;
use toaster_config::Config;
use toaster_core::hw_error::map_hw_error;
use toaster_core::{Model, PhaseCfg, PowerLevel, RunSummary, Timeouts, Toaster, ToasterError};
use toaster_hardware::{SimParams, SimToaster};
use toaster_traits::{Clock, ColorSample, ColorSensor, Heater, ManualClock, MonotonicClock};

use crate::cli::Backend;
use crate::prompt;
use crate::record::CsvRecordSink;

/// Test hooks for the simulator, read from the environment.
const SIM_BIAS_ENV: &str = "TOASTER_TEST_SIM_BIAS";
const SIM_FAIL_ENV: &str = "TOASTER_TEST_SIM_FAIL";

/// Reads a self-check may spend on banner or half lines before giving up.
const SELF_CHECK_READS: u32 = 5;

pub struct Devices {
    pub sensor: Box<dyn ColorSensor>,
    pub heater: Box<dyn Heater>,
    pub clock: Box<dyn Clock + Send + Sync>,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}

fn simulated(cfg: &Config, realtime: bool) -> Devices {
    let phase: PhaseCfg = (&cfg.phase).into();
    let model = Model::new((&cfg.model).into(), phase.goldening_threshold_s);
    let ratios = phase.effectiveness;

    let params = SimParams {
        sample_period: Duration::from_millis(cfg.sim.sample_period_ms),
        bias: env_parse(SIM_BIAS_ENV).unwrap_or(cfg.sim.bias),
        fail_after: env_parse(SIM_FAIL_ENV),
    };
    tracing::info!(
        bias = params.bias,
        fail_after = ?params.fail_after,
        realtime,
        "using simulated toaster"
    );

    // Without --realtime the sensor's sample period and the loop's poll delay
    // advance a shared manual clock, so a full run takes milliseconds.
    let (sim_clock, clock): (Arc<dyn Clock + Send + Sync>, Box<dyn Clock + Send + Sync>) =
        if realtime {
            (Arc::new(MonotonicClock::new()), Box::new(MonotonicClock::new()))
        } else {
            let c = ManualClock::new();
            (Arc::new(c.clone()), Box::new(c))
        };
    let sim = SimToaster::new(
        sim_clock,
        Box::new(move |percent: u8| {
            PowerLevel::from_percent(percent).map_or(0.0, |p| ratios.ratio(p))
        }),
    );
    let profile = Box::new(move |t: f64| model.baseline_profile(t));
    let (sensor, heater) = sim.devices(profile, params);
    Devices {
        sensor: Box::new(sensor),
        heater: Box::new(heater),
        clock,
    }
}

#[cfg(feature = "hardware")]
fn serial(cfg: &Config, port: &str) -> eyre::Result<Devices> {
    let settings = toaster_hardware::PortSettings {
        baud: cfg.serial.baud,
        read_timeout: Duration::from_millis(cfg.serial.read_timeout_ms),
        settle: Duration::from_millis(cfg.serial.settle_ms),
    };
    let (sensor, heater) = toaster_hardware::open_serial(port, &settings)
        .map_err(|e| map_hw_error(&e))
        .wrap_err_with(|| format!("opening serial port {port}"))?;
    Ok(Devices {
        sensor: Box::new(sensor),
        heater: Box::new(heater),
        clock: Box::new(MonotonicClock::new()),
    })
}

#[cfg(not(feature = "hardware"))]
fn serial(_cfg: &Config, port: &str) -> eyre::Result<Devices> {
    Err(ToasterError::Hardware(format!(
        "serial support is not built in (port {port}); rebuild with --features hardware or pass --sim"
    ))
    .into())
}

pub fn open_devices(cfg: &Config, backend: &Backend) -> eyre::Result<Devices> {
    if backend.sim {
        Ok(simulated(cfg, backend.realtime))
    } else {
        let port = backend.port.as_deref().unwrap_or(&cfg.serial.port);
        serial(cfg, port)
    }
}

pub struct ToastOpts {
    pub target: Option<i32>,
    pub record: Option<PathBuf>,
    pub no_prompt: bool,
    pub backend: Backend,
}

pub struct ToastReport {
    pub summary: RunSummary,
    pub record: PathBuf,
}

fn resolve_target(opts: &ToastOpts) -> eyre::Result<Option<i32>> {
    if opts.target.is_some() {
        return Ok(opts.target);
    }
    let stdin = std::io::stdin();
    if opts.no_prompt || !stdin.is_terminal() {
        tracing::info!("no target given; monitoring only");
        return Ok(None);
    }
    prompt::ask_target(stdin.lock(), std::io::stdout())
        .map_err(|e| ToasterError::Io(e.to_string()))
        .wrap_err("reading target from the terminal")
}

pub fn run_toast(cfg: &Config, opts: ToastOpts, stop: &AtomicBool) -> eyre::Result<ToastReport> {
    let target = resolve_target(&opts)?;
    let Devices {
        sensor,
        heater,
        clock,
    } = open_devices(cfg, &opts.backend)?;

    let mut toaster = Toaster::builder()
        .with_sensor(sensor)
        .with_heater(heater)
        .with_model((&cfg.model).into())
        .with_control((&cfg.control).into())
        .with_phase((&cfg.phase).into())
        .with_completion((&cfg.completion).into())
        .with_timeouts((&cfg.serial).into())
        .with_target(target)
        .with_clock(clock)
        .build()?;

    let record = opts
        .record
        .unwrap_or_else(|| PathBuf::from(&cfg.record.path));
    let mut sink = CsvRecordSink::create(&record)?;
    let summary = toaster.run(&mut sink, stop)?;
    Ok(ToastReport { summary, record })
}

fn read_one(sensor: &mut dyn ColorSensor, timeout: Duration) -> eyre::Result<ColorSample> {
    for attempt in 1..=SELF_CHECK_READS {
        match sensor.read(timeout).map_err(|e| map_hw_error(&*e))? {
            Some(sample) => return Ok(sample),
            None => tracing::debug!(attempt, "incomplete reading"),
        }
    }
    Err(ToasterError::Timeout).wrap_err("no complete reading from the sensor")
}

/// Read one sample and command the heater off. Both devices are closed
/// whatever happens.
pub fn self_check(cfg: &Config, backend: &Backend) -> eyre::Result<ColorSample> {
    let Devices {
        mut sensor,
        mut heater,
        ..
    } = open_devices(cfg, backend)?;
    let timeouts: Timeouts = (&cfg.serial).into();

    let sample = read_one(&mut *sensor, Duration::from_millis(timeouts.sensor_ms));
    let off = heater.off().map_err(|e| map_hw_error(&*e));
    if let Err(e) = sensor.close() {
        tracing::warn!(error = %e, "closing sensor failed");
    }
    if let Err(e) = heater.close() {
        tracing::warn!(error = %e, "closing heater failed");
    }

    let sample = sample?;
    off.wrap_err("switching heater off")?;
    Ok(sample)
}
