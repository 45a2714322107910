//! Operator target entry.

use std::io::{BufRead, Write};

use toaster_core::builder::MAX_TARGET;

/// Interpret the operator's answer. Blank means no target; anything that is
/// not an integer in range disables completion with a warning.
pub fn parse_target(answer: &str) -> Option<i32> {
    let answer = answer.trim();
    if answer.is_empty() {
        tracing::info!("no target entered; monitoring only");
        return None;
    }
    match answer.parse::<i32>() {
        Ok(v) if (0..=MAX_TARGET).contains(&v) => Some(v),
        Ok(v) => {
            tracing::warn!(
                value = v,
                max = MAX_TARGET,
                "target out of range; completion disabled"
            );
            None
        }
        Err(_) => {
            tracing::warn!(input = answer, "target is not a number; completion disabled");
            None
        }
    }
}

pub fn ask_target<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
) -> std::io::Result<Option<i32>> {
    write!(
        output,
        "Enter target R value (lower is darker), or leave blank to just monitor: "
    )?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(parse_target(&line))
}
