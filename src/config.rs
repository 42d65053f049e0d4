use std::{
    fs, io,
    path::{Path, PathBuf},
};

use pl_power_rateplan::pricing::{ScheduleConfig, TariffPricing};
use serde::Deserialize;
use thiserror::Error;

/// Pricing and off-peak hours, read from a TOML file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub pricing: TariffPricing,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse `{path}`")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }
}
