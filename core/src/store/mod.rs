//! Ledger storage
//!
//! [`LedgerStore`] is the seam between the ledger policy and whatever holds
//! the durable state. Each method is one atomic write or read; read-modify-write
//! sequences spanning several calls are serialized by the callers.

mod memory;

pub use memory::MemoryStore;

use chrono::{DateTime, Utc};

use crate::model::{Level, LevelContent, LevelId, ScoreDraft, ScoreEntry, ScoreId, UserId};

/// Storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("level {0} not found")]
    LevelNotFound(LevelId),

    #[error("score {0} not found")]
    ScoreNotFound(ScoreId),

    /// Compare-and-swap on a level's version lost a race
    #[error("level {level_id} is at version {actual}, expected {expected}")]
    VersionConflict {
        level_id: LevelId,
        expected: u32,
        actual: u32,
    },

    #[error("title {title:?} is already used by level {level_id}")]
    TitleTaken { title: String, level_id: LevelId },

    /// A verification link would point a level at a score for another version
    #[error("score {score_id} cannot verify version {version} of level {level_id}")]
    VerificationMismatch {
        level_id: LevelId,
        version: u32,
        score_id: ScoreId,
    },

    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Backend refused or failed the operation
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable state behind the ledger.
pub trait LedgerStore: Send + Sync {
    fn level(&self, id: LevelId) -> StoreResult<Option<Level>>;

    fn level_by_title(&self, title: &str) -> StoreResult<Option<Level>>;

    /// Insert a level at version 1 with no verification anchor.
    ///
    /// Fails with [`StoreError::TitleTaken`] if the title is in use.
    fn create_level(
        &self,
        author: UserId,
        content: &LevelContent,
        at: DateTime<Utc>,
    ) -> StoreResult<Level>;

    /// Replace a level's content and bump its version from `expected_version`
    /// to `expected_version + 1`, clearing the verification anchor.
    ///
    /// Fails with [`StoreError::VersionConflict`] if the stored version is not
    /// `expected_version`.
    fn advance_level(
        &self,
        id: LevelId,
        expected_version: u32,
        content: &LevelContent,
        at: DateTime<Utc>,
    ) -> StoreResult<Level>;

    /// Point the level at `score` as proof for `version`.
    ///
    /// Fails unless the level is at `version` and the score belongs to that
    /// level and is tagged with `version`.
    fn link_verification(&self, id: LevelId, version: u32, score: ScoreId) -> StoreResult<Level>;

    /// Most recent creation or overwrite by this author.
    fn latest_publish_at(&self, author: UserId) -> StoreResult<Option<DateTime<Utc>>>;

    fn score(&self, id: ScoreId) -> StoreResult<Option<ScoreEntry>>;

    /// The entry currently standing for (user, level), whatever its version.
    fn current_score(&self, user: UserId, level: LevelId) -> StoreResult<Option<ScoreEntry>>;

    /// Write a new entry and make it current for its (user, level) pair.
    ///
    /// The previous current entry, if any, stays stored. Fails with
    /// [`StoreError::VersionConflict`] unless the draft's `level_version` is the
    /// level's version at the moment of the write.
    fn insert_score(&self, draft: ScoreDraft, at: DateTime<Utc>) -> StoreResult<ScoreEntry>;

    /// Overwrite an entry in place, keeping its id, owner and `created_at`.
    ///
    /// Checks the draft's `level_version` like [`LedgerStore::insert_score`].
    fn improve_score(
        &self,
        id: ScoreId,
        draft: ScoreDraft,
        at: DateTime<Utc>,
    ) -> StoreResult<ScoreEntry>;

    fn set_hidden(&self, id: ScoreId, hidden: bool) -> StoreResult<ScoreEntry>;

    /// Every stored entry for the level, all versions.
    fn level_scores(&self, level: LevelId) -> StoreResult<Vec<ScoreEntry>>;

    /// Delete entries of `level` tagged with a version below `current_version`.
    fn purge_superseded(&self, level: LevelId, current_version: u32) -> StoreResult<usize>;
}
