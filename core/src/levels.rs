//! Level publication and versioning
//!
//! [`LevelVersionManager::publish`] is the only writer of a level's version.
//! Creating a level starts it at version 1; overwriting bumps the version by
//! exactly one with a compare-and-swap in the store, which silently retires
//! every score recorded against the previous version.
//!
//! Each publication carries the author's own clear of the new content. The
//! level is written unverified first, then the clear is recorded through the
//! [`ScoreLedger`], then the level is pointed at it. A failure between those
//! steps leaves the level unverified rather than anchored to a stale score.

use std::sync::Arc;

use crate::clock::Clock;
use crate::config::{PublishConfig, RetentionPolicy};
use crate::ledger::{ScoreLedger, SubmissionError};
use crate::model::{Level, LevelContent, LevelId, UserId};
use crate::replay::{DecodeError, ReplayRecord, decode_b64};
use crate::store::{LedgerStore, StoreError};
use crate::sync::KeyedLocks;

/// Minimum and maximum length of a level code.
pub const CODE_LEN: std::ops::RangeInclusive<usize> = 1023..=3073;
/// Cells checked at the start of a level code.
pub const CODE_CELLS: usize = 1024;
/// Digits in a non-empty cell.
const TILE_DIGITS: usize = 3;

/// Problems with author-supplied level content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("title must be 1 to {max} characters, got {len}")]
    TitleLength { len: usize, max: usize },

    #[error("description must be at most {max} characters, got {len}")]
    DescriptionTooLong { len: usize, max: usize },

    #[error("level code must be 1023 to 3073 characters, got {len}")]
    CodeLength { len: usize },

    #[error("level code has {found:?} at offset {offset}; only '/' and digits are allowed")]
    CodeCharacter { offset: usize, found: char },

    #[error("level code cell {cell} at offset {offset} is neither '/' nor a three-digit tile")]
    CodeCell { cell: usize, offset: usize },
}

/// Reasons a publication is refused.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("invalid level: {0}")]
    InvalidContent(#[from] ContentError),

    #[error("invalid verification replay: {0}")]
    InvalidReplay(#[from] DecodeError),

    #[error("level {0} does not exist")]
    UnknownLevel(LevelId),

    /// Overwrite not confirmed, or another publication won the race
    #[error("level {level_id}: {reason}")]
    Conflict {
        level_id: LevelId,
        reason: &'static str,
    },

    #[error("level {0} belongs to another author")]
    Forbidden(LevelId),

    #[error("a level titled {title:?} already exists (id {level_id})")]
    TitleTaken { title: String, level_id: LevelId },

    #[error("publishing too often; retry in {retry_after_secs}s")]
    TooFrequent { retry_after_secs: u64 },

    /// The level was written but is left without a verification anchor
    #[error("level {level_id} saved unverified: {source}")]
    VerificationLinkFailed {
        level_id: LevelId,
        #[source]
        source: SubmissionError,
    },

    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for PublishError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::TitleTaken { title, level_id } => PublishError::TitleTaken { title, level_id },
            StoreError::VersionConflict { level_id, .. } => PublishError::Conflict {
                level_id,
                reason: "level was modified concurrently",
            },
            StoreError::LevelNotFound(id) => PublishError::UnknownLevel(id),
            other => PublishError::Storage(other),
        }
    }
}

/// Check content against the level grammar and the configured limits.
pub fn validate_content(content: &LevelContent, config: &PublishConfig) -> Result<(), ContentError> {
    let title_len = content.title.chars().count();
    if title_len == 0 || title_len > config.max_title_len {
        return Err(ContentError::TitleLength {
            len: title_len,
            max: config.max_title_len,
        });
    }

    let description_len = content.description.chars().count();
    if description_len > config.max_description_len {
        return Err(ContentError::DescriptionTooLong {
            len: description_len,
            max: config.max_description_len,
        });
    }

    validate_code(&content.code)
}

/// A level code is a run of `/` and digits whose first [`CODE_CELLS`] cells
/// are each an empty cell (`/`) or a three-digit tile.
pub fn validate_code(code: &str) -> Result<(), ContentError> {
    if let Some((offset, found)) = code
        .char_indices()
        .find(|&(_, c)| c != '/' && !c.is_ascii_digit())
    {
        return Err(ContentError::CodeCharacter { offset, found });
    }
    // ASCII from here on, so bytes and chars agree.
    if !CODE_LEN.contains(&code.len()) {
        return Err(ContentError::CodeLength { len: code.len() });
    }

    let bytes = code.as_bytes();
    let mut offset = 0;
    for cell in 0..CODE_CELLS {
        match bytes.get(offset) {
            Some(b'/') => offset += 1,
            Some(_)
                if bytes
                    .get(offset..offset + TILE_DIGITS)
                    .is_some_and(|tile| tile.iter().all(u8::is_ascii_digit)) =>
            {
                offset += TILE_DIGITS
            }
            _ => return Err(ContentError::CodeCell { cell, offset }),
        }
    }
    Ok(())
}

/// Sole writer of level content and versions.
pub struct LevelVersionManager<S> {
    store: Arc<S>,
    ledger: Arc<ScoreLedger<S>>,
    clock: Arc<dyn Clock>,
    config: PublishConfig,
    retention: RetentionPolicy,
    author_locks: KeyedLocks<UserId>,
    level_locks: KeyedLocks<LevelId>,
}

impl<S: LedgerStore> LevelVersionManager<S> {
    pub fn new(store: Arc<S>, ledger: Arc<ScoreLedger<S>>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            ledger,
            clock,
            config: PublishConfig::default(),
            retention: RetentionPolicy::default(),
            author_locks: KeyedLocks::new(),
            level_locks: KeyedLocks::new(),
        }
    }

    pub fn with_config(mut self, config: PublishConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// Create a level or overwrite one of the author's levels.
    ///
    /// `target` addresses an existing level by id; `None` resolves by title,
    /// creating a new level when the title is free. Overwrites require
    /// `overwrite = true`. `replay` is the author's clear of `content` and
    /// becomes the verification anchor of the resulting version.
    pub fn publish(
        &self,
        target: Option<LevelId>,
        content: LevelContent,
        replay: ReplayRecord,
        author: UserId,
        overwrite: bool,
    ) -> Result<Level, PublishError> {
        validate_content(&content, &self.config)?;

        let _author_guard = self.author_locks.lock(&author);
        self.check_cooldown(author)?;

        let existing = match target {
            Some(id) => {
                let level = self.store.level(id)?.ok_or(PublishError::UnknownLevel(id))?;
                if level.author_id != author {
                    return Err(PublishError::Forbidden(id));
                }
                Some(level)
            }
            None => match self.store.level_by_title(&content.title)? {
                Some(level) if level.author_id != author => {
                    return Err(PublishError::TitleTaken {
                        title: content.title,
                        level_id: level.id,
                    });
                }
                other => other,
            },
        };

        match existing {
            None => self.create(content, replay, author),
            Some(level) if !overwrite => Err(PublishError::Conflict {
                level_id: level.id,
                reason: "level exists and overwrite was not requested",
            }),
            Some(level) => self.overwrite(level, content, replay, author),
        }
    }

    /// [`publish`](Self::publish) with the verification replay as base64 text.
    pub fn publish_b64(
        &self,
        target: Option<LevelId>,
        content: LevelContent,
        verification: &str,
        author: UserId,
        overwrite: bool,
    ) -> Result<Level, PublishError> {
        validate_content(&content, &self.config)?;
        let replay = decode_b64(verification, self.ledger.decode_options()).inspect_err(|e| {
            tracing::warn!(author = author.get(), error = %e, "verification replay rejected");
        })?;
        self.publish(target, content, replay, author, overwrite)
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    fn check_cooldown(&self, author: UserId) -> Result<(), PublishError> {
        let Some(last) = self.store.latest_publish_at(author)? else {
            return Ok(());
        };
        let cooldown = i64::try_from(self.config.cooldown_secs).unwrap_or(i64::MAX);
        let since = (self.clock.now() - last).num_seconds();
        if since < cooldown {
            let retry_after_secs = (cooldown - since.max(0)) as u64;
            tracing::debug!(author = author.get(), retry_after_secs, "publish throttled");
            return Err(PublishError::TooFrequent { retry_after_secs });
        }
        Ok(())
    }

    fn create(
        &self,
        content: LevelContent,
        replay: ReplayRecord,
        author: UserId,
    ) -> Result<Level, PublishError> {
        let level = self.store.create_level(author, &content, self.clock.now())?;
        let _level_guard = self.level_locks.lock(&level.id);

        let level = self.anchor(level, replay, author)?;
        tracing::info!(
            level_id = level.id.get(),
            author = author.get(),
            title = %level.title,
            "level published"
        );
        Ok(level)
    }

    fn overwrite(
        &self,
        level: Level,
        content: LevelContent,
        replay: ReplayRecord,
        author: UserId,
    ) -> Result<Level, PublishError> {
        let _level_guard = self.level_locks.lock(&level.id);

        let previous = level.version;
        let level = self
            .store
            .advance_level(level.id, previous, &content, self.clock.now())?;

        if self.retention == RetentionPolicy::PurgeSuperseded {
            let purged = self.store.purge_superseded(level.id, level.version)?;
            tracing::debug!(level_id = level.id.get(), purged, "superseded scores purged");
        }

        let level = self.anchor(level, replay, author)?;
        tracing::info!(
            level_id = level.id.get(),
            from = previous,
            to = level.version,
            "level overwritten"
        );
        Ok(level)
    }

    /// Record the author's clear against the level's current version and
    /// point the level at it.
    fn anchor(
        &self,
        level: Level,
        replay: ReplayRecord,
        author: UserId,
    ) -> Result<Level, PublishError> {
        let link_failed = |source: SubmissionError| {
            tracing::warn!(
                level_id = level.id.get(),
                version = level.version,
                error = %source,
                "level left unverified"
            );
            PublishError::VerificationLinkFailed {
                level_id: level.id,
                source,
            }
        };

        let entry = match self.ledger.submit(replay, author, level.id, level.version) {
            Ok(entry) => entry,
            Err(SubmissionError::VersionMismatch { .. }) => {
                return Err(PublishError::Conflict {
                    level_id: level.id,
                    reason: "level was modified concurrently",
                });
            }
            Err(e) => return Err(link_failed(e)),
        };

        self.store
            .link_verification(level.id, level.version, entry.id)
            .map_err(|e| link_failed(SubmissionError::Storage(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sample_code, sample_content};

    #[test]
    fn sample_content_is_valid() {
        assert_eq!(
            validate_content(&sample_content("Anything"), &PublishConfig::default()),
            Ok(())
        );
    }

    #[test]
    fn title_and_description_limits() {
        let config = PublishConfig::default();
        let mut content = sample_content("");
        assert_eq!(
            validate_content(&content, &config),
            Err(ContentError::TitleLength { len: 0, max: 49 })
        );

        content.title = "é".repeat(49);
        assert_eq!(validate_content(&content, &config), Ok(()));
        content.title.push('x');
        assert!(matches!(
            validate_content(&content, &config),
            Err(ContentError::TitleLength { len: 50, .. })
        ));

        let mut content = sample_content("Described");
        content.description = "d".repeat(256);
        assert_eq!(validate_content(&content, &config), Ok(()));
        content.description.push('d');
        assert!(matches!(
            validate_content(&content, &config),
            Err(ContentError::DescriptionTooLong { len: 257, max: 256 })
        ));
    }

    #[test]
    fn code_grammar() {
        // all empty cells
        assert_eq!(validate_code(&"/".repeat(1024)), Ok(()));
        // all tiles, at the length ceiling
        assert_eq!(validate_code(&"123".repeat(1024)), Ok(()));
        // trailing data after the checked cells is free-form
        let mut code = sample_code();
        code.push_str("9/9");
        assert_eq!(validate_code(&code), Ok(()));
    }

    #[test]
    fn code_rejections() {
        assert_eq!(
            validate_code(&"/".repeat(1022)),
            Err(ContentError::CodeLength { len: 1022 })
        );
        assert_eq!(
            validate_code(&"/".repeat(3074)),
            Err(ContentError::CodeLength { len: 3074 })
        );
        // passes the length check but runs out of cells
        assert_eq!(
            validate_code(&"/".repeat(1023)),
            Err(ContentError::CodeCell {
                cell: 1023,
                offset: 1023
            })
        );

        let mut code = "/".repeat(1024);
        code.replace_range(10..11, "x");
        assert_eq!(
            validate_code(&code),
            Err(ContentError::CodeCharacter {
                offset: 10,
                found: 'x'
            })
        );

        // a two-digit tile
        let code = format!("12/{}", "/".repeat(1030));
        assert_eq!(
            validate_code(&code),
            Err(ContentError::CodeCell { cell: 0, offset: 0 })
        );
    }

    #[test]
    fn store_errors_map_to_publish_errors() {
        let err: PublishError = StoreError::VersionConflict {
            level_id: LevelId(3),
            expected: 1,
            actual: 2,
        }
        .into();
        assert!(matches!(err, PublishError::Conflict { level_id: LevelId(3), .. }));

        let err: PublishError = StoreError::TitleTaken {
            title: "T".into(),
            level_id: LevelId(4),
        }
        .into();
        assert!(matches!(err, PublishError::TitleTaken { level_id: LevelId(4), .. }));

        let err: PublishError = StoreError::Unavailable("down".into()).into();
        assert!(matches!(err, PublishError::Storage(_)));
    }
}
