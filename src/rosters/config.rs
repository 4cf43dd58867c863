use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::tournaments::scores::ScoreWeights;

/// Settings for roster generation. Seats per judge are not configurable;
/// see [`crate::tournaments::events::EventKind::seats_per_judge`].
///
/// ```toml
/// speech_draw_every = 5
/// seed = 42
///
/// [weights]
/// tournament = 0.7
/// effort = 0.3
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct RosterConfig {
    pub weights: ScoreWeights,
    /// In Speech events every n-th seat filled by rank is instead drawn at
    /// random from the middle third of the remaining field. `0` turns the
    /// draw off.
    pub speech_draw_every: usize,
    /// Fixes the Speech draw. Without a seed the draw uses OS entropy.
    pub seed: Option<u64>,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            speech_draw_every: 5,
            seed: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid roster configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl RosterConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_toml(&contents)
    }

    pub fn rng(&self) -> ChaCha20Rng {
        match self.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_os_rng(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::RosterConfig;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(RosterConfig::from_toml("").unwrap(), RosterConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let config = RosterConfig::from_toml(
            r#"
            seed = 9

            [weights]
            effort = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, Some(9));
        assert_eq!(config.speech_draw_every, 5);
        assert_eq!(config.weights.tournament, Decimal::new(7, 1));
        assert_eq!(config.weights.effort, Decimal::new(5, 1));
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(RosterConfig::from_toml("speech_draw_every = \"often\"").is_err());
    }
}
