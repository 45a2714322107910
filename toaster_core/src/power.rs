//! Discrete heater power levels.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerLevel {
    Off,
    Reduced,
    Baseline,
    Full,
}

impl PowerLevel {
    /// Command value sent to the heater.
    #[inline]
    pub const fn percent(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Reduced => 60,
            Self::Baseline => 80,
            Self::Full => 100,
        }
    }

    pub const fn from_percent(p: u8) -> Option<Self> {
        match p {
            0 => Some(Self::Off),
            60 => Some(Self::Reduced),
            80 => Some(Self::Baseline),
            100 => Some(Self::Full),
            _ => None,
        }
    }
}

impl fmt::Display for PowerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

#[cfg(test)]
mod tests {
    use super::PowerLevel;

    #[test]
    fn percent_round_trips_for_every_level() {
        for p in [
            PowerLevel::Off,
            PowerLevel::Reduced,
            PowerLevel::Baseline,
            PowerLevel::Full,
        ] {
            assert_eq!(PowerLevel::from_percent(p.percent()), Some(p));
        }
        assert_eq!(PowerLevel::from_percent(50), None);
    }

    #[test]
    fn displays_as_percent() {
        assert_eq!(PowerLevel::Baseline.to_string(), "80%");
    }
}
