//! `vnsrc` configuration file parser.
//!
//! One setting per line:
//!
//! | Key | Value | Default |
//! |-----|-------|---------|
//! | `strict` | `true`/`false` | `false` |
//! | `log_level` | `off`, `error`, `warn`, `info`, `debug`, `trace` | `warn` |
//! | `indent_width` | spaces per indent step | `2` |
//! | `wait_scale` | percent applied to `[wait]` times, `0` skips waits | `100` |
//! | `auto_advance` | `true`/`false`: do not block on `[l]` | `false` |
//! | `color` | `true`/`false` | on when stdout is a terminal |
//!
//! Lines starting with `;` or `#` are comments.  A value may be wrapped in
//! double quotes.

use std::path::Path;
use std::str::FromStr;

use log::LevelFilter;
use thiserror::Error;

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a config file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub strict: bool,
    pub log_level: LevelFilter,
    pub indent_width: usize,
    pub wait_scale: u32,
    pub auto_advance: bool,
    /// `None` means decide from whether stdout is a terminal.
    pub color: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            strict: false,
            log_level: LevelFilter::Warn,
            indent_width: 2,
            wait_scale: 100,
            auto_advance: false,
            color: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config string.
    ///
    /// Bad lines are reported and skipped; every good line still applies.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                errors.push(ConfigError {
                    line: lineno,
                    message: format!("expected `key = value`, got {line:?}"),
                });
                continue;
            };
            let key = key.trim();
            let value = unquote(value.trim());

            if let Err(message) = config.apply(key, value) {
                errors.push(ConfigError { line: lineno, message });
            }
        }

        (config, errors)
    }

    /// Read and parse a config file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }

    /// Set one key.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "strict" => self.strict = parse_bool(key, value)?,
            "auto_advance" => self.auto_advance = parse_bool(key, value)?,
            "color" => self.color = Some(parse_bool(key, value)?),
            "log_level" => {
                self.log_level = LevelFilter::from_str(value)
                    .map_err(|_| format!("log_level: unknown level {value:?}"))?;
            }
            "indent_width" => {
                self.indent_width = value
                    .parse()
                    .map_err(|_| format!("indent_width: expected a number, got {value:?}"))?;
            }
            "wait_scale" => {
                self.wait_scale = value
                    .parse()
                    .map_err(|_| format!("wait_scale: expected a percentage, got {value:?}"))?;
            }
            _ => return Err(format!("unknown setting {key:?}")),
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(format!("{key}: expected true or false, got {value:?}")),
    }
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(s)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
