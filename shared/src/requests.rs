//! API request types.

use serde::{Deserialize, Serialize};

use crate::ids::LevelId;

/// Upload a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReplayRequest {
    /// Standard base64 of the replay bytes.
    pub replay: String,
    /// Level to score against. Defaults to the level id in the replay header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_id: Option<LevelId>,
}

/// Leaderboard query for one level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSearchRequest {
    /// Id of the last entry already seen; `-1` or absent starts from the top.
    #[serde(default = "default_cursor")]
    pub cursor: i64,
    /// Page size (1-20).
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// One of "time", "author", "createdAt", "updatedAt".
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    /// "asc" or "desc".
    #[serde(default = "default_order")]
    pub order: String,
}

fn default_cursor() -> i64 {
    crate::END_CURSOR
}

fn default_limit() -> u32 {
    20
}

fn default_sort_by() -> String {
    "time".to_string()
}

fn default_order() -> String {
    "asc".to_string()
}

impl Default for ScoreSearchRequest {
    fn default() -> Self {
        Self {
            cursor: default_cursor(),
            limit: default_limit(),
            sort_by: default_sort_by(),
            order: default_order(),
        }
    }
}

/// Publish a new level or overwrite one of your own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishLevelRequest {
    /// Tile code of the level.
    pub code: String,
    /// Title (1-49 characters, unique across levels).
    pub title: String,
    /// Optional description (max 256 characters).
    #[serde(default)]
    pub description: String,
    /// Standard base64 of the author's clearing replay.
    pub verification: String,
    /// Confirm replacing an existing level with the same title.
    #[serde(default)]
    pub overwrite: bool,
}
