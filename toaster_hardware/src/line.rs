//! Text protocol spoken by the sensor board.
//!
//! Each reading is two lines:
//!
//! ```text
//! Ambient: 412 Red: 188 Green: 131 Blue: 97
//! L: 61.20 a: 18.43 b: 27.90
//! ```
//!
//! Parsing is token based. Labels must appear in this order; anything after
//! the last value is ignored.

use toaster_traits::{ColorSample, Lab};

/// Raw channel counts from the first line of a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channels {
    pub ambient: u32,
    pub red: u32,
    pub green: u32,
    pub blue: u32,
}

impl Channels {
    pub fn with_lab(self, lab: Lab) -> ColorSample {
        ColorSample {
            ambient: self.ambient,
            red: self.red,
            green: self.green,
            blue: self.blue,
            lab,
        }
    }
}

const CHANNEL_LABELS: [&str; 4] = ["Ambient:", "Red:", "Green:", "Blue:"];
const LAB_LABELS: [&str; 3] = ["L:", "a:", "b:"];

/// Cheap prefix test used to decide whether a line starts a reading.
#[inline]
pub fn is_channels_line(line: &str) -> bool {
    line.trim_start().starts_with(CHANNEL_LABELS[0])
}

fn labelled<'a, const N: usize>(line: &'a str, labels: &[&str; N]) -> Option<[&'a str; N]> {
    let mut tokens = line.split_whitespace();
    let mut out = [""; N];
    for (slot, label) in out.iter_mut().zip(labels) {
        if tokens.next()? != *label {
            return None;
        }
        *slot = tokens.next()?;
    }
    Some(out)
}

pub fn parse_channels(line: &str) -> Option<Channels> {
    let [ambient, red, green, blue] = labelled(line, &CHANNEL_LABELS)?;
    Some(Channels {
        ambient: ambient.parse().ok()?,
        red: red.parse().ok()?,
        green: green.parse().ok()?,
        blue: blue.parse().ok()?,
    })
}

pub fn parse_lab(line: &str) -> Option<Lab> {
    let [l, a, b] = labelled(line, &LAB_LABELS)?;
    let lab = Lab {
        l: l.parse().ok()?,
        a: a.parse().ok()?,
        b: b.parse().ok()?,
    };
    (lab.l.is_finite() && lab.a.is_finite() && lab.b.is_finite()).then_some(lab)
}

/// Render a sample back into the two wire lines. Used by the simulator and
/// by tests that script a serial stream.
pub fn format_sample(s: &ColorSample) -> String {
    format!(
        "Ambient: {} Red: {} Green: {} Blue: {}\nL: {:.2} a: {:.2} b: {:.2}\n",
        s.ambient, s.red, s.green, s.blue, s.lab.l, s.lab.a, s.lab.b
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_line() {
        let c = parse_channels("Ambient: 412 Red: 188 Green: 131 Blue: 97").unwrap();
        assert_eq!(
            c,
            Channels {
                ambient: 412,
                red: 188,
                green: 131,
                blue: 97
            }
        );
        assert!(parse_channels("Ambient: 412 Red: 188 Green: 131").is_none());
        assert!(parse_channels("Ambient: 412 Red: -1 Green: 131 Blue: 97").is_none());
        assert!(parse_channels("Red: 188 Ambient: 412 Green: 131 Blue: 97").is_none());
    }

    #[test]
    fn lab_line_accepts_signed_values() {
        let lab = parse_lab("L: 61.20 a: -1.5 b: 27.90").unwrap();
        assert_eq!(lab.l, 61.2);
        assert_eq!(lab.a, -1.5);
        assert!(parse_lab("L: nan a: 1 b: 2").is_none());
        assert!(parse_lab("L: 1 a: 2").is_none());
    }

    #[test]
    fn formatted_sample_parses_back() {
        let s = ColorSample {
            ambient: 400,
            red: 150,
            green: 120,
            blue: 90,
            lab: Lab {
                l: 50.0,
                a: 10.25,
                b: -3.5,
            },
        };
        let text = format_sample(&s);
        let mut lines = text.lines();
        let c = parse_channels(lines.next().unwrap()).unwrap();
        let lab = parse_lab(lines.next().unwrap()).unwrap();
        assert_eq!(c.with_lab(lab), s);
    }
}
