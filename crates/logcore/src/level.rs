/// Severity levels, integer-ordered so admission checks are plain comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Critical = 5,
    Off = 6,
}

impl Level {
    pub const ALL: [Level; 7] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Critical,
        Level::Off,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Maps a raw byte back to a `Level`, clamping anything out of range to
    /// `Off` (fail safe: an unrecognized level never admits a record).
    pub fn from_u8(value: u8) -> Level {
        Self::ALL.get(value as usize).copied().unwrap_or(Level::Off)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Critical => "critical",
            Level::Off => "off",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_matches_severity() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Error < Level::Critical);
        assert!(Level::Critical < Level::Off);
    }
}
