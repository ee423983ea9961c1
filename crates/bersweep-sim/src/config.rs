//! Configuration — INI loading, validation, and component selection
//!
//! Parameters come from an INI file with dotted keys: `[section]` headers
//! flatten into `section.key` lookups, `#` and `;` start comments, and
//! whitespace around `=` is trimmed. Every key is required; a missing key
//! or unconvertible value is fatal and reported with the offending key,
//! value, and reason.
//!
//! ```ini
//! [snr]
//! start_db = 0.0
//! stop_db  = 10.0
//! step_db  = 1.0      # inclusive grid
//!
//! [model]
//! modem    = ask4_gray
//! channel  = awgn
//! coder    = conv_k7_r12
//! frame_len = 1024
//! ```
//!
//! Selector strings are matched case-insensitively; `ask4` is a synonym
//! for `ask4_gray`, and `ask4_binary`/`ask4_nogray` for `ask4_natural`.

use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use bersweep_core::modem::{Ask2Modem, Ask4Mapping, Ask4Modem, Modem};
use bersweep_core::{AwgnChannel, Channel, Coder, ConvK7R12, RayleighChannel, Uncoded};
use thiserror::Error;

/// Errors raised while loading or applying a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("cannot open config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A required `section.key` entry is absent
    #[error("missing required key in config: {0}")]
    MissingKey(String),

    /// A value failed to convert to its expected type
    #[error("invalid value for key '{key}': '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// A value converted but violates a range rule
    #[error("{0}")]
    Validation(String),

    /// A modem/channel/coder selector names no known implementation
    #[error("unknown {kind}: {name}")]
    UnknownSelector { kind: &'static str, name: String },
}

/// Validated simulation parameters, immutable once loaded.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// SNR grid start in dB.
    pub snr_start_db: f64,
    /// SNR grid stop in dB (inclusive).
    pub snr_stop_db: f64,
    /// SNR grid step in dB (> 0).
    pub snr_step_db: f64,
    /// Errors to accumulate before CI goals may stop a point (0 disables).
    pub min_errors: u64,
    /// Hard per-point cap on simulated bits (0 disables).
    pub max_bits: u64,
    /// BER floor for early termination (0 disables).
    pub ber_floor: f64,
    /// Output file or directory.
    pub outfile: String,
    /// Master seed (0 derives one from clock and entropy).
    pub seed: u64,
    /// Modem selector string.
    pub modem: String,
    /// Channel selector string.
    pub channel: String,
    /// Coder selector string.
    pub coder: String,
    /// Information bits per frame (> 0).
    pub frame_len: usize,
    /// Confidence level in (0, 1).
    pub ci_level: f64,
    /// Absolute CI half-width goal (0 disables).
    pub ci_abs: f64,
    /// Relative CI half-width goal (0 disables).
    pub ci_rel: f64,
    /// Bits required before CI-based stopping may fire.
    pub ci_min_bits: u64,
    /// Worker threads (0 means detected concurrency).
    pub threads: u32,
}

impl SimConfig {
    /// Load and validate a configuration file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse and validate configuration text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let kv = parse_ini(text);

        let cfg = Self {
            snr_start_db: require(&kv, "snr.start_db")?,
            snr_stop_db: require(&kv, "snr.stop_db")?,
            snr_step_db: require(&kv, "snr.step_db")?,
            min_errors: require(&kv, "stopping.min_errors")?,
            max_bits: require(&kv, "stopping.max_bits")?,
            ber_floor: require(&kv, "stopping.ber_floor")?,
            outfile: require(&kv, "io.file")?,
            seed: require(&kv, "rng.seed")?,
            modem: require(&kv, "model.modem")?,
            channel: require(&kv, "model.channel")?,
            coder: require(&kv, "model.coder")?,
            frame_len: require(&kv, "model.frame_len")?,
            ci_level: require(&kv, "ci.level")?,
            ci_abs: require(&kv, "ci.abs")?,
            ci_rel: require(&kv, "ci.rel")?,
            ci_min_bits: require(&kv, "ci.min_bits")?,
            threads: require(&kv, "parallel.threads")?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.snr_step_db <= 0.0 {
            return Err(ConfigError::Validation("snr.step_db must be > 0".into()));
        }
        if self.snr_stop_db < self.snr_start_db {
            return Err(ConfigError::Validation(
                "snr.stop_db must be >= snr.start_db".into(),
            ));
        }
        if self.ber_floor < 0.0 {
            return Err(ConfigError::Validation(
                "stopping.ber_floor must be >= 0".into(),
            ));
        }
        if self.frame_len == 0 {
            return Err(ConfigError::Validation("model.frame_len must be > 0".into()));
        }
        if !(self.ci_level > 0.0 && self.ci_level < 1.0) {
            return Err(ConfigError::Validation("ci.level must be in (0,1)".into()));
        }
        if self.ci_abs < 0.0 || self.ci_rel < 0.0 {
            return Err(ConfigError::Validation(
                "ci.abs and ci.rel must be >= 0".into(),
            ));
        }
        Ok(())
    }

    /// Instantiate the configured modem.
    pub fn build_modem(&self) -> Result<Box<dyn Modem>, ConfigError> {
        match self.modem.to_ascii_lowercase().as_str() {
            "ask2" => Ok(Box::new(Ask2Modem)),
            "ask4" | "ask4_gray" => Ok(Box::new(Ask4Modem::new(Ask4Mapping::Gray))),
            "ask4_natural" | "ask4_binary" | "ask4_nogray" => {
                Ok(Box::new(Ask4Modem::new(Ask4Mapping::Natural)))
            }
            _ => Err(ConfigError::UnknownSelector {
                kind: "modem",
                name: self.modem.clone(),
            }),
        }
    }

    /// Instantiate the configured channel.
    pub fn build_channel(&self) -> Result<Box<dyn Channel>, ConfigError> {
        match self.channel.to_ascii_lowercase().as_str() {
            "awgn" => Ok(Box::new(AwgnChannel)),
            "rayleigh" => Ok(Box::new(RayleighChannel)),
            _ => Err(ConfigError::UnknownSelector {
                kind: "channel",
                name: self.channel.clone(),
            }),
        }
    }

    /// Instantiate the configured coder.
    pub fn build_coder(&self) -> Result<Box<dyn Coder>, ConfigError> {
        match self.coder.to_ascii_lowercase().as_str() {
            "uncoded" => Ok(Box::new(Uncoded)),
            "conv_k7_r12" => Ok(Box::new(ConvK7R12::new())),
            _ => Err(ConfigError::UnknownSelector {
                kind: "coder",
                name: self.coder.clone(),
            }),
        }
    }
}

/// Flatten INI text into `section.key` → value.
fn parse_ini(text: &str) -> HashMap<String, String> {
    let mut kv = HashMap::new();
    let mut section = String::new();

    for raw in text.lines() {
        let line = match raw.find(['#', ';']) {
            Some(cut) => &raw[..cut],
            None => raw,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            section = line[1..line.len() - 1].trim().to_string();
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                continue;
            }
            let full = if section.is_empty() {
                key.to_string()
            } else {
                format!("{}.{}", section, key)
            };
            kv.insert(full, value.to_string());
        }
    }
    kv
}

/// Look up a required key and convert it.
fn require<T>(kv: &HashMap<String, String>, key: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let value = kv
        .get(key)
        .ok_or_else(|| ConfigError::MissingKey(key.to_string()))?;
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.clone(),
        reason: e.to_string(),
    })
}
