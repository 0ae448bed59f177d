//! Score ledger
//!
//! Keeps one authoritative [`ScoreEntry`] per (user, level). A submission
//! replaces the standing entry only when it is strictly faster on the same
//! level version, or when the level has moved to a new version since the
//! entry was written.
//!
//! Submissions for the same (user, level) pair are serialized; different
//! pairs proceed independently.

use std::sync::Arc;

use crate::clock::Clock;
use crate::config::RetentionPolicy;
use crate::model::{LevelId, ScoreDraft, ScoreEntry, ScoreId, UserId};
use crate::replay::{DecodeError, DecodeOptions, ReplayRecord, decode_b64};
use crate::store::{LedgerStore, StoreError};
use crate::sync::KeyedLocks;

/// Reasons a submission is refused.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("level {0} does not exist")]
    UnknownLevel(LevelId),

    /// No level given and the replay header names none
    #[error("replay is not tied to a published level (header id {0})")]
    Unpublished(i32),

    /// Replay was recorded against a version the level has since left
    #[error("level is at version {current}, submission targets version {submitted}")]
    VersionMismatch { submitted: u32, current: u32 },

    #[error("replay rejected: {0}")]
    InvalidReplay(#[from] DecodeError),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Reasons a read or visibility change on a single entry is refused.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("score {0} not found")]
    NotFound(ScoreId),

    #[error("score {0} belongs to another user")]
    Forbidden(ScoreId),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// What a submission did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// First entry for this (user, level)
    Created,
    /// Faster run on the same version, written in place
    Improved,
    /// First entry on a new level version; the old one stays stored
    NewVersion,
    /// Not faster; the standing entry is untouched
    Kept,
}

impl SubmitOutcome {
    /// Whether the submitted run is now the user's standing entry.
    pub fn is_new_best(self) -> bool {
        !matches!(self, SubmitOutcome::Kept)
    }
}

/// The authoritative entry after a submission, and how it got there.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub entry: ScoreEntry,
    pub outcome: SubmitOutcome,
}

/// Per-(user, level) best-time bookkeeping over a [`LedgerStore`].
pub struct ScoreLedger<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    decode_options: DecodeOptions,
    retention: RetentionPolicy,
    locks: KeyedLocks<(UserId, LevelId)>,
}

impl<S: LedgerStore> ScoreLedger<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            decode_options: DecodeOptions::default(),
            retention: RetentionPolicy::default(),
            locks: KeyedLocks::new(),
        }
    }

    /// Tolerance used by [`upload_b64`](Self::upload_b64).
    pub fn with_decode_options(mut self, options: DecodeOptions) -> Self {
        self.decode_options = options;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn decode_options(&self) -> &DecodeOptions {
        &self.decode_options
    }

    /// Record a run against `current_level_version` of a level.
    ///
    /// Returns the entry that is authoritative for (user, level) afterwards,
    /// which is the existing one when the run was not strictly faster.
    pub fn submit(
        &self,
        replay: ReplayRecord,
        user: UserId,
        level: LevelId,
        current_level_version: u32,
    ) -> Result<ScoreEntry, SubmissionError> {
        self.submit_detailed(replay, user, level, current_level_version)
            .map(|submission| submission.entry)
    }

    /// Like [`submit`](Self::submit) but also reports what happened.
    pub fn submit_detailed(
        &self,
        replay: ReplayRecord,
        user: UserId,
        level: LevelId,
        current_level_version: u32,
    ) -> Result<Submission, SubmissionError> {
        let _guard = self.locks.lock(&(user, level));

        let stored = self
            .store
            .level(level)?
            .ok_or(SubmissionError::UnknownLevel(level))?;
        if stored.version != current_level_version {
            return Err(SubmissionError::VersionMismatch {
                submitted: current_level_version,
                current: stored.version,
            });
        }

        self.apply(replay, user, level, current_level_version)
    }

    /// Record a run against whatever version the level is at now.
    ///
    /// `level` defaults to the id in the replay header.
    pub fn submit_current(
        &self,
        replay: ReplayRecord,
        user: UserId,
        level: Option<LevelId>,
    ) -> Result<Submission, SubmissionError> {
        let level = match level {
            Some(level) => level,
            None => {
                let raw = replay.header().level_id;
                LevelId::from_header(raw).ok_or(SubmissionError::Unpublished(raw))?
            }
        };

        let _guard = self.locks.lock(&(user, level));
        let stored = self
            .store
            .level(level)?
            .ok_or(SubmissionError::UnknownLevel(level))?;
        self.apply(replay, user, level, stored.version)
    }

    /// Decode a base64 upload and record it against the current version.
    pub fn upload_b64(
        &self,
        text: &str,
        user: UserId,
        level: Option<LevelId>,
    ) -> Result<Submission, SubmissionError> {
        let replay = decode_b64(text, &self.decode_options).inspect_err(|e| {
            tracing::warn!(user = user.get(), error = %e, "replay upload rejected");
        })?;
        self.submit_current(replay, user, level)
    }

    /// Fetch an entry if the requester may see it.
    pub fn get(&self, id: ScoreId, requester: Option<UserId>) -> Result<ScoreEntry, AccessError> {
        match self.store.score(id)? {
            Some(entry) if entry.visible_to(requester) => Ok(entry),
            _ => Err(AccessError::NotFound(id)),
        }
    }

    /// Hide or reveal an entry. Only its owner may do this.
    pub fn set_hidden(
        &self,
        id: ScoreId,
        requester: UserId,
        hidden: bool,
    ) -> Result<ScoreEntry, AccessError> {
        let entry = self.store.score(id)?.ok_or(AccessError::NotFound(id))?;
        if entry.user_id != requester {
            return Err(AccessError::Forbidden(id));
        }
        if entry.hidden == hidden {
            return Ok(entry);
        }
        let entry = self.store.set_hidden(id, hidden)?;
        tracing::info!(score_id = id.get(), hidden, "score visibility changed");
        Ok(entry)
    }

    /// Caller holds the (user, level) lock. The version may still move under
    /// a concurrent overwrite; the store refuses the write if it has.
    fn apply(
        &self,
        replay: ReplayRecord,
        user: UserId,
        level: LevelId,
        version: u32,
    ) -> Result<Submission, SubmissionError> {
        let existing = self.store.current_score(user, level)?;
        let now = self.clock.now();
        let time = replay.elapsed_time();
        let draft = ScoreDraft::from_replay(replay, user, level, version);

        let (entry, outcome) = match existing {
            None => (
                self.store.insert_score(draft, now).map_err(stale_write)?,
                SubmitOutcome::Created,
            ),
            Some(old) if old.level_version != version => {
                let entry = self.store.insert_score(draft, now).map_err(stale_write)?;
                if self.retention == RetentionPolicy::PurgeSuperseded {
                    self.store.purge_superseded(level, version)?;
                }
                (entry, SubmitOutcome::NewVersion)
            }
            Some(old) if time < old.elapsed_time => (
                self.store
                    .improve_score(old.id, draft, now)
                    .map_err(stale_write)?,
                SubmitOutcome::Improved,
            ),
            Some(old) => {
                tracing::debug!(
                    user = user.get(),
                    level = level.get(),
                    time,
                    best = old.elapsed_time,
                    "submission not faster than standing entry"
                );
                return Ok(Submission {
                    entry: old,
                    outcome: SubmitOutcome::Kept,
                });
            }
        };

        tracing::info!(
            user = user.get(),
            level = level.get(),
            version,
            score_id = entry.id.get(),
            time,
            ?outcome,
            "score recorded"
        );
        Ok(Submission { entry, outcome })
    }
}

/// A score write refused because the level moved to another version.
fn stale_write(err: StoreError) -> SubmissionError {
    match err {
        StoreError::VersionConflict {
            expected, actual, ..
        } => SubmissionError::VersionMismatch {
            submitted: expected,
            current: actual,
        },
        other => SubmissionError::Storage(other),
    }
}
