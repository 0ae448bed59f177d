//! Ledger records: levels and the scores posted against them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::replay::ReplayRecord;
pub use tilerun_shared::{LevelId, ScoreId, UserId};

/// A user's run on one version of a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub id: ScoreId,
    pub user_id: UserId,
    pub level_id: LevelId,
    /// Level version this run was achieved against
    pub level_version: u32,
    /// Declared completion time in seconds
    pub elapsed_time: f32,
    /// Replay bytes exactly as uploaded
    #[serde(with = "b64_bytes")]
    pub replay_bytes: Vec<u8>,
    pub format_version: String,
    pub used_alt_controls: bool,
    pub hidden: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScoreEntry {
    /// Whether this entry competes on the level's current version.
    pub fn contends_on(&self, level: &Level) -> bool {
        self.level_id == level.id && self.level_version == level.version
    }

    /// Hidden entries are visible to their owner only.
    pub fn visible_to(&self, requester: Option<UserId>) -> bool {
        !self.hidden || requester == Some(self.user_id)
    }
}

/// Everything needed to write a score entry, minus the store-assigned fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreDraft {
    pub user_id: UserId,
    pub level_id: LevelId,
    pub level_version: u32,
    pub elapsed_time: f32,
    pub replay_bytes: Vec<u8>,
    pub format_version: String,
    pub used_alt_controls: bool,
}

impl ScoreDraft {
    pub fn from_replay(
        replay: ReplayRecord,
        user_id: UserId,
        level_id: LevelId,
        level_version: u32,
    ) -> Self {
        let (header, _, raw) = replay.into_parts();
        Self {
            user_id,
            level_id,
            level_version,
            elapsed_time: header.elapsed_time,
            replay_bytes: raw,
            format_version: header.format_version,
            used_alt_controls: header.used_alt_controls,
        }
    }
}

/// A published level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub id: LevelId,
    pub author_id: UserId,
    pub code: String,
    pub title: String,
    pub description: String,
    /// Bumped by exactly one on every accepted overwrite
    pub version: u32,
    /// Score entry proving the current version is beatable
    pub verification_score_id: Option<ScoreId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Author-supplied level content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelContent {
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Serde adapter storing replay bytes as standard base64.
mod b64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}
