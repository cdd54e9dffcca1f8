//! Configuration for rork-trackid
//!
//! Every tunable threshold of the pipeline lives here so the precision/recall
//! tradeoff can be adjusted without code changes. All fields have built-in
//! defaults; a config file only needs the values it overrides.
//!
//! **Priority:** CLI argument → `RORK_TRACKID_CONFIG` → `~/.config/rork/rork-trackid.toml` → defaults

use crate::error::{IdError, IdResult};
use rork_common::config::{load_toml, resolve_config_path, LoggingConfig};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "RORK_TRACKID_CONFIG";

/// Default config file name under the platform config directory
pub const CONFIG_FILE_NAME: &str = "rork-trackid.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackIdConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub merge: MergeConfig,
}

/// Which side of `A - B` is the artist when nothing else decides it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashOrientation {
    /// `Artist - Title` (most tracklists)
    #[default]
    ArtistTitle,
    /// `Title - Artist`
    TitleArtist,
}

/// Mention parser settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub default_orientation: DashOrientation,
    /// Extra placeholder tokens rejected in addition to the built-in list
    pub extra_noise_tokens: Vec<String>,
    /// Minimum normalized length of a candidate line
    pub min_length: usize,
    /// Maximum normalized length of a candidate line
    pub max_length: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            default_orientation: DashOrientation::ArtistTitle,
            extra_noise_tokens: Vec::new(),
            min_length: 3,
            max_length: 200,
        }
    }
}

/// One endorsement bonus tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EndorsementTier {
    pub min_count: u32,
    pub bonus: f32,
}

/// Confidence scorer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub base: f32,
    pub timestamp_bonus: f32,
    pub tracklist_bonus: f32,
    /// Timestamps in one block for it to count as a dedicated tracklist
    pub tracklist_min_timestamps: usize,
    /// Highest `min_count` first; the first tier reached applies
    pub endorsement_tiers: Vec<EndorsementTier>,
    /// Bonus when the author looks like a tracklist/trackid account
    pub authority_bonus: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base: 0.3,
            timestamp_bonus: 0.2,
            tracklist_bonus: 0.2,
            tracklist_min_timestamps: 5,
            endorsement_tiers: vec![
                EndorsementTier { min_count: 50, bonus: 0.15 },
                EndorsementTier { min_count: 10, bonus: 0.10 },
                EndorsementTier { min_count: 3, bonus: 0.05 },
            ],
            authority_bonus: 0.1,
        }
    }
}

/// Entity matching and resolution thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum similarity for an artist fuzzy match
    pub artist_fuzzy_floor: f32,
    /// Minimum blended score for a track fuzzy match
    pub track_fuzzy_floor: f32,
    /// `get_or_create` reuses an existing entity at or above this confidence
    pub accept_threshold: f32,
    /// Track resolution links the artist at or above this confidence
    pub artist_link_threshold: f32,
    /// Maximum candidates pulled from the store for fuzzy scans
    pub candidate_pool_cap: usize,
    /// Title share of the track fuzzy blend (artist gets the rest)
    pub title_weight: f32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            artist_fuzzy_floor: 0.8,
            track_fuzzy_floor: 0.75,
            accept_threshold: 0.9,
            artist_link_threshold: 0.8,
            candidate_pool_cap: 1000,
            title_weight: 0.6,
        }
    }
}

/// Dedup and merge windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Mentions closer than this with the same title are one event
    pub dedup_window_secs: u32,
    /// Incoming tracks closer than this to a different track are a conflict
    pub conflict_window_secs: u32,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            dedup_window_secs: 60,
            conflict_window_secs: 60,
        }
    }
}

impl TrackIdConfig {
    /// Resolve, load and validate the config file
    pub fn load(cli_arg: Option<&str>) -> IdResult<Self> {
        let path = resolve_config_path(cli_arg, CONFIG_ENV_VAR, CONFIG_FILE_NAME);
        let config: TrackIdConfig = load_toml(path.as_deref())?;
        config.validate()?;

        info!(
            orientation = ?config.parser.default_orientation,
            accept_threshold = config.matching.accept_threshold,
            "Track identification config loaded"
        );
        Ok(config)
    }

    /// Parse from a TOML string (tests, embedded defaults)
    pub fn from_toml_str(content: &str) -> IdResult<Self> {
        let config: TrackIdConfig =
            toml::from_str(content).map_err(|e| IdError::Config(format!("Parse failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> IdResult<()> {
        let unit_values = [
            ("scoring.base", self.scoring.base),
            ("scoring.timestamp_bonus", self.scoring.timestamp_bonus),
            ("scoring.tracklist_bonus", self.scoring.tracklist_bonus),
            ("scoring.authority_bonus", self.scoring.authority_bonus),
            ("matching.artist_fuzzy_floor", self.matching.artist_fuzzy_floor),
            ("matching.track_fuzzy_floor", self.matching.track_fuzzy_floor),
            ("matching.accept_threshold", self.matching.accept_threshold),
            ("matching.artist_link_threshold", self.matching.artist_link_threshold),
            ("matching.title_weight", self.matching.title_weight),
        ];

        for (name, value) in unit_values {
            if !(0.0..=1.0).contains(&value) {
                return Err(IdError::Config(format!(
                    "{} must be within 0.0-1.0, got {}",
                    name, value
                )));
            }
        }

        if self.parser.min_length > self.parser.max_length {
            return Err(IdError::Config(format!(
                "parser.min_length ({}) exceeds parser.max_length ({})",
                self.parser.min_length, self.parser.max_length
            )));
        }

        if self.matching.candidate_pool_cap == 0 {
            return Err(IdError::Config(
                "matching.candidate_pool_cap must be at least 1".to_string(),
            ));
        }

        // Tiers must not reward fewer endorsements more than more endorsements
        let mut tiers = self.scoring.endorsement_tiers.clone();
        tiers.sort_by(|a, b| b.min_count.cmp(&a.min_count));
        for pair in tiers.windows(2) {
            if pair[1].bonus > pair[0].bonus {
                return Err(IdError::Config(format!(
                    "endorsement tier {} has a larger bonus than tier {}",
                    pair[1].min_count, pair[0].min_count
                )));
            }
        }
        if tiers.iter().any(|t| t.bonus < 0.0) {
            return Err(IdError::Config(
                "endorsement bonuses must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}
