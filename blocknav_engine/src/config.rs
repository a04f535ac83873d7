// Data-driven navigation configuration.
//
// Every tunable the engine reads lives in `NavConfig`, loaded from JSON at
// startup (`NavConfig::from_json`) or built from `Default`. Missing fields
// fall back to their defaults, so a config file only needs to mention what
// it changes. The graph never hard-codes penalties or policy switches: it
// asks the path constraint, which is configured from this struct, and the
// executor and world actions read their thresholds from here too.
//
// Field groups:
// - breaking policy: `allow_block_breaking`, `allow_breaking_undiggable`,
//   `avoid_breaking` (block names never broken), `break_block_penalty`;
// - placing policy: `allow_block_placing`, `place_block_penalty`,
//   `creative_block_placement` (placing never depletes blocks);
// - movement policy: `squeeze_through_diagonals`;
// - hostile avoidance: `avoid_harmful_entities`, `max_enemy_penalty`;
// - execution: `max_error_distance`, `recalculate_settle_ms`,
//   `yaw_noise_threshold_degrees`.
//
// See also: `constraint.rs` for `DefaultPathConstraint::new`, which turns
// this into policy, `executor.rs` and `world_action.rs` for the execution
// thresholds.

use crate::costs::{BREAK_BLOCK_PENALTY, PLACE_BLOCK_PENALTY};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("navigation config JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid navigation config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Break blocks even when the block registry marks them undiggable.
    pub allow_breaking_undiggable: bool,
    /// Block names that are never broken, e.g. a base's walls.
    pub avoid_breaking: Vec<String>,
    pub allow_block_breaking: bool,
    pub allow_block_placing: bool,
    /// When false, any non-empty corner block blocks a diagonal move.
    pub squeeze_through_diagonals: bool,
    pub break_block_penalty: f64,
    pub place_block_penalty: f64,
    /// Placed blocks do not deplete the inventory.
    pub creative_block_placement: bool,
    pub avoid_harmful_entities: bool,
    /// Cost added right next to a hostile mob, falling off linearly to 0
    /// at its follow range.
    pub max_enemy_penalty: f64,
    /// Blocks between the bot and the current step target before the
    /// executor gives up on the plan.
    pub max_error_distance: f64,
    /// Pause before a mid-route recalculation, so falls finish first.
    pub recalculate_settle_ms: u64,
    /// Yaw changes below this are not sent, to avoid jitter.
    pub yaw_noise_threshold_degrees: f32,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            allow_breaking_undiggable: false,
            avoid_breaking: Vec::new(),
            allow_block_breaking: true,
            allow_block_placing: true,
            squeeze_through_diagonals: true,
            break_block_penalty: BREAK_BLOCK_PENALTY,
            place_block_penalty: PLACE_BLOCK_PENALTY,
            creative_block_placement: false,
            avoid_harmful_entities: true,
            max_enemy_penalty: 50.0,
            max_error_distance: 20.0,
            recalculate_settle_ms: 1000,
            yaw_noise_threshold_degrees: 5.0,
        }
    }
}

impl NavConfig {
    /// Parse and validate a config. Absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: NavConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reject values the graph cannot work with: negative penalties would
    /// make costs non-positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.break_block_penalty < 0.0 || !self.break_block_penalty.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "break_block_penalty must be a non-negative number, got {}",
                self.break_block_penalty
            )));
        }
        if self.place_block_penalty < 0.0 || !self.place_block_penalty.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "place_block_penalty must be a non-negative number, got {}",
                self.place_block_penalty
            )));
        }
        if self.max_enemy_penalty < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "max_enemy_penalty must be non-negative, got {}",
                self.max_enemy_penalty
            )));
        }
        if self.max_error_distance <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "max_error_distance must be positive, got {}",
                self.max_error_distance
            )));
        }
        Ok(())
    }
}
