//! API response types for the score ledger.

use serde::{Deserialize, Serialize};

use crate::ids::{LevelId, ScoreId, UserId};

/// A stored score as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    /// Score entry identifier.
    pub id: ScoreId,
    /// Owner of the run.
    pub user: UserId,
    /// Level the run was played on.
    pub level_id: LevelId,
    /// Completion time in seconds, as declared by the replay header.
    pub time: f32,
    /// Game build tag the replay was recorded with.
    pub version: String,
    /// Standard base64 of the replay bytes, verbatim.
    pub raw: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    /// Milliseconds since the Unix epoch.
    pub updated_at: i64,
    /// Whether the alternate control scheme was used.
    pub alt: bool,
    /// Level version this score was achieved against.
    pub level_version: u32,
    /// Hidden scores are only listed for their owner.
    pub hidden: bool,
}

/// One page of a leaderboard listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoresPage {
    pub scores: Vec<ScoreResponse>,
    /// Id of the last entry on this page, or [`crate::END_CURSOR`] when exhausted.
    pub cursor: i64,
}

/// Short form of a record holder shown on level cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordStub {
    pub user: UserId,
    pub time: f32,
    pub version: u32,
}

/// A level with its ledger-derived fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelResponse {
    pub id: LevelId,
    pub code: String,
    pub author_id: UserId,
    pub title: String,
    pub description: String,
    pub created_at: i64,
    pub updated_at: i64,
    /// Fastest visible run on the current version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<RecordStub>,
    /// The requester's own run on the current version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_record: Option<RecordStub>,
    /// Number of visible runs contending on the current version.
    pub records: u32,
    /// Score entry that verifies the current version, if linked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_id: Option<ScoreId>,
    pub version: u32,
}

/// Reply to a replay upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReplayResponse {
    /// The authoritative best time for this user and level after the upload.
    pub new_best: f32,
}
