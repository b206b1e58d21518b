use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::midicsv::{Converter, MidiCsvError, DEFAULT_TEMPO};

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Settings read from config.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub converter: ConverterConfig,
    pub output: OutputConfig,
    pub timing: TimingConfig,
}

/// How binary MIDI files are turned into CSV
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// External program invoked as `<command> <file>`
    pub command: String,
    /// Use the built-in decoder instead of the external program
    pub builtin: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Decimal places for seconds
    pub precision: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Microseconds per quarter note before the first tempo change
    pub default_tempo: u32,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        ConverterConfig {
            command: "midicsv".to_string(),
            builtin: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig { precision: 6 }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            default_tempo: DEFAULT_TEMPO,
        }
    }
}

impl ConverterConfig {
    pub fn converter(&self) -> Converter {
        if self.builtin {
            Converter::Builtin
        } else {
            Converter::External(self.command.clone())
        }
    }
}

impl Config {
    pub fn from_toml(contents: &str) -> Result<Config, MidiCsvError> {
        let config: Config =
            toml::from_str(contents).map_err(|e| MidiCsvError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), MidiCsvError> {
        if self.timing.default_tempo == 0 {
            return Err(MidiCsvError::Config(
                "timing.default_tempo must be greater than 0".to_string(),
            ));
        }
        if !self.converter.builtin && self.converter.command.trim().is_empty() {
            return Err(MidiCsvError::Config(
                "converter.command must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from config.toml in the working directory
pub fn load_config() -> Result<Config, MidiCsvError> {
    match File::open(DEFAULT_CONFIG_FILE) {
        Ok(mut file) => {
            let mut contents = String::new();
            file.read_to_string(&mut contents)?;
            Config::from_toml(&contents)
        }
        Err(_) => {
            // If file doesn't exist, return default config
            Ok(Config::default())
        }
    }
}

/// Load configuration from a file the user named explicitly
pub fn load_config_from(path: &Path) -> Result<Config, MidiCsvError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        MidiCsvError::Config(format!("cannot read {}: {}", path.display(), e))
    })?;
    Config::from_toml(&contents)
}
