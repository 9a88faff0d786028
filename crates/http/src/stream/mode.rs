//! fopen-style access modes.
//!
//! A mode string starts with one of `r`, `w`, `a`, `x` or `c`, optionally followed by
//! `+` (read and write) and `b`/`t` translation flags, e.g. `"r"`, `"w+b"`, `"rb+"`.

use std::fmt;
use std::fs::OpenOptions;
use std::str::FromStr;

use crate::ensure;
use crate::protocol::StreamError;

/// The access mode a [`Handle`](super::Handle) was opened with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mode {
    raw: String,
}

impl Mode {
    /// Parses and validates a mode string.
    pub fn parse(mode: &str) -> Result<Self, StreamError> {
        let mut chars = mode.chars();
        let first = chars.next().ok_or_else(|| StreamError::invalid_argument("empty stream mode"))?;
        ensure!(
            matches!(first, 'r' | 'w' | 'a' | 'x' | 'c'),
            StreamError::invalid_argument(format!("invalid stream mode: {mode}"))
        );

        let mut seen = String::with_capacity(3);
        for flag in chars {
            ensure!(
                matches!(flag, '+' | 'b' | 't') && !seen.contains(flag),
                StreamError::invalid_argument(format!("invalid stream mode: {mode}"))
            );
            seen.push(flag);
        }

        Ok(Self { raw: mode.to_owned() })
    }

    /// Builds a mode from a literal known to be valid.
    pub(crate) fn from_static(mode: &'static str) -> Self {
        Self { raw: mode.to_owned() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True if the mode contains `r` or `+`.
    pub fn is_readable(&self) -> bool {
        self.raw.contains(['r', '+'])
    }

    /// True if the mode contains any of `x`, `w`, `c`, `a` or `+`.
    pub fn is_writable(&self) -> bool {
        self.raw.contains(['x', 'w', 'c', 'a', '+'])
    }

    /// Translates the mode into file open options.
    pub(crate) fn open_options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        let plus = self.raw.contains('+');
        options.read(self.is_readable());

        match self.raw.chars().next() {
            Some('w') => options.write(true).create(true).truncate(true),
            Some('a') => options.append(true).create(true),
            Some('x') => options.write(true).create_new(true),
            Some('c') => options.write(true).create(true),
            _ => options.write(plus),
        };

        options
    }
}

impl FromStr for Mode {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
