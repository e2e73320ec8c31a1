//! Allows configuration stuff to be read from hurl.json
//!
//! The file carries the ports, the default channel name, and the static
//! mapping of channel name to the source address that feeds it.  Missing
//! file or missing keys fall back to the defaults passed to build.
use json::JsonValue;
use log::{info, warn};
use regex::Regex;
use std::{error::Error, fmt, io::ErrorKind};

#[derive(Debug)]
pub struct MissingConfigError {
    key: String,
}

impl fmt::Display for MissingConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Required configuration value '{}' is missing", self.key)
    }
}

impl Error for MissingConfigError {}

pub struct Config {
    filename: String,
    settings: JsonValue,
    defaults: JsonValue,
}

impl Config {
    pub fn build(filename: String, defaults: JsonValue) -> Result<Config, std::io::Error> {
        // Validate filename only contains valid characters and ends in .json
        let filename_regex = Regex::new(r"^[a-zA-Z0-9_\-\./]+\.json$").unwrap();
        if !filename_regex.is_match(&filename) {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                "Invalid filename - must contain only letters, numbers, underscore, dash, dot and end in .json"
            ));
        }

        let mut config = Config {
            filename,
            settings: json::object! {},
            defaults,
        };

        if let Err(err) = config.load_from_file() {
            warn!("Using default settings: {}", err);
        }

        Ok(config)
    }

    fn load_from_file(&mut self) -> std::io::Result<()> {
        match std::fs::read_to_string(&self.filename) {
            Ok(raw_data) => {
                match json::parse(&raw_data) {
                    Ok(parsed) => {
                        self.settings.clone_from(&parsed);
                        info!("Loaded settings from {}", self.filename);
                        Ok(())
                    }
                    Err(err) => {
                        warn!("Failed to parse config file {}: {}", self.filename, err);
                        Ok(())
                    }
                }
            }
            Err(err) => Err(err),
        }
    }

    pub fn get_str_value(
        &self,
        key: &str,
        default: Option<String>,
    ) -> Result<String, MissingConfigError> {
        // First check settings
        if let Some(val) = self.settings[key].as_str() {
            return Ok(val.to_string());
        }

        // If explicit default is provided, use it
        if let Some(def) = default {
            return Ok(def);
        }

        // Otherwise check defaults
        if let Some(val) = self.defaults[key].as_str() {
            return Ok(val.to_string());
        }

        // If no value found anywhere, return error
        Err(MissingConfigError {
            key: key.to_string(),
        })
    }

    pub fn get_u32_value(&self, key: &str, default: Option<u32>) -> Result<u32, MissingConfigError> {
        // First check settings
        if let Some(val) = self.settings[key].as_u32() {
            return Ok(val);
        }

        // If explicit default is provided, use it
        if let Some(def) = default {
            return Ok(def);
        }

        // Otherwise check defaults
        if let Some(val) = self.defaults[key].as_u32() {
            return Ok(val);
        }

        // If no value found anywhere, return error
        Err(MissingConfigError {
            key: key.to_string(),
        })
    }

    /// read the channel map under key: an object of channel name to source
    /// address.  Settings win over defaults wholesale; the two are not merged.
    pub fn get_channel_map(&self, key: &str) -> Vec<(String, String)> {
        let obj = if self.settings[key].is_object() {
            &self.settings[key]
        } else {
            &self.defaults[key]
        };
        let mut map: Vec<(String, String)> = Vec::new();
        for (channel, source) in obj.entries() {
            match source.as_str() {
                Some(s) => map.push((channel.to_string(), s.to_string())),
                None => {
                    warn!("channel {} has a non-string source, skipping", channel);
                }
            }
        }
        map
    }
}
