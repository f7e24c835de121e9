//! crates/logging/src/config.rs
//! Verbosity configuration derived from the command line.

use super::levels::{LogFlag, LogLevels};

/// Per-subsystem verbosity configuration.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerbosityConfig {
    /// Level for each flag.
    pub levels: LogLevels,
}

impl VerbosityConfig {
    /// Creates a configuration from a `--debug` count.
    ///
    /// - `0`: warnings and errors only.
    /// - `1`: planned actions, mount checks and report decisions at info.
    /// - `2`: every subsystem at debug.
    /// - `3` and above: every subsystem at trace.
    #[must_use]
    pub fn from_verbose_level(level: u8) -> Self {
        let mut config = Self::default();
        match level {
            0 => {}
            1 => {
                config.levels.plan = 1;
                config.levels.mount = 1;
                config.levels.report = 1;
            }
            2 => config.levels.set_all(2),
            _ => config.levels.set_all(3),
        }
        config
    }

    /// Returns the level configured for `flag`.
    #[must_use]
    pub const fn level(&self, flag: LogFlag) -> u8 {
        self.levels.get(flag)
    }

    /// Returns a copy with `flag` raised (or lowered) to `level`.
    #[must_use]
    pub fn with_level(mut self, flag: LogFlag, level: u8) -> Self {
        self.levels.set(flag, level);
        self
    }

    /// Applies a comma separated list of `FLAG[LEVEL]` entries, such as
    /// `walk2,plan`. A missing level means `1`.
    pub fn apply_flags(&mut self, spec: &str) -> Result<(), String> {
        for item in spec.split(',').map(str::trim).filter(|item| !item.is_empty()) {
            let split = item
                .find(|c: char| c.is_ascii_digit())
                .unwrap_or(item.len());
            let (name, digits) = item.split_at(split);
            let flag = LogFlag::from_name(name)
                .ok_or_else(|| format!("unknown debug flag '{name}'"))?;
            let level = if digits.is_empty() {
                1
            } else {
                digits
                    .parse::<u8>()
                    .map_err(|_| format!("invalid level in debug flag '{item}'"))?
            };
            self.levels.set(flag, level);
        }
        Ok(())
    }
}
