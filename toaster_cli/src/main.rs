mod cli;
mod error_fmt;
mod logging;
mod prompt;
mod record;
mod toast;

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use toaster_config::Config;
use toaster_core::ToasterError;
use toaster_traits::ColorSample;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::toast::{ToastOpts, ToastReport};

fn load_config(cli: &Cli) -> eyre::Result<Config> {
    let cfg = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| ToasterError::Config(format!("{}: {e}", path.display())))?;
            toaster_config::load_toml(&text)
                .map_err(|e| ToasterError::Config(format!("{}: {e}", path.display())))?
        }
        None => Config::default(),
    };
    cfg.validate()
        .map_err(|e| ToasterError::Config(e.to_string()))?;
    Ok(cfg)
}

fn print_summary(report: &ToastReport, json: bool) {
    let s = &report.summary;
    if json {
        let v = serde_json::json!({
            "outcome": s.outcome.as_str(),
            "elapsed_s": s.elapsed_s,
            "transition_s": s.transition_s,
            "effective_s": s.effective_s,
            "target": s.target,
            "hits": s.hits,
            "last_r": s.last_r,
            "cycles": s.cycles,
            "skipped": s.skipped,
            "record": report.record.display().to_string(),
        });
        println!("{v}");
        return;
    }
    let how = match s.outcome {
        toaster_core::RunOutcome::TargetReached => "target reached",
        toaster_core::RunOutcome::Interrupted => "stopped by user",
    };
    println!("Toasting finished: {how}");
    println!(
        "  elapsed {:.2}s, effective {:.2}s at baseline power",
        s.elapsed_s, s.effective_s
    );
    if let Some(t) = s.transition_s {
        println!("  goldening ended at {t:.2}s");
    }
    if let Some(target) = s.target {
        println!("  readings at or below {target}: {}", s.hits);
    }
    if let Some(r) = s.last_r {
        println!("  last R: {r}");
    }
    println!(
        "  {} readings processed, {} skipped; log written to {}",
        s.cycles,
        s.skipped,
        report.record.display()
    );
}

fn print_sample(sample: &ColorSample, json: bool) {
    if json {
        let v = serde_json::json!({
            "ok": true,
            "ambient": sample.ambient,
            "r": sample.red,
            "g": sample.green,
            "b": sample.blue,
            "lab": [sample.lab.l, sample.lab.a, sample.lab.b],
        });
        println!("{v}");
    } else {
        println!(
            "Self-check ok: Ambient {} R {} G {} B {} (L {:.2} a {:.2} b {:.2})",
            sample.ambient,
            sample.red,
            sample.green,
            sample.blue,
            sample.lab.l,
            sample.lab.a,
            sample.lab.b
        );
    }
}

fn run(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(&cli)?;
    logging::init(cli.json, &cli.log_level, &cfg.logging)
        .map_err(|e| ToasterError::Config(format!("logging: {e}")))?;

    match cli.cmd {
        Commands::Toast {
            target,
            record,
            no_prompt,
            backend,
        } => {
            let stop = Arc::new(AtomicBool::new(false));
            let flag = stop.clone();
            if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
                tracing::warn!(error = %e, "could not install Ctrl-C handler");
            }
            let opts = ToastOpts {
                target,
                record,
                no_prompt,
                backend,
            };
            let report = toast::run_toast(&cfg, opts, &stop).wrap_err("toasting")?;
            print_summary(&report, cli.json);
        }
        Commands::SelfCheck { backend } => {
            let sample = toast::self_check(&cfg, &backend).wrap_err("self-check")?;
            print_sample(&sample, cli.json);
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("warning: color-eyre not installed: {e}");
    }

    if let Err(err) = run(cli) {
        let json = JSON_MODE.get().copied().unwrap_or(false);
        if json {
            println!("{}", error_fmt::format_error_json(&err));
        } else {
            eprintln!("{}", error_fmt::humanize(&err));
        }
        tracing::debug!(error = ?err, "exiting with error");
        std::process::exit(error_fmt::exit_code_for_error(&err));
    }
}
