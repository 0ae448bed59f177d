//! Shared test utilities for integration and unit tests

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::clock::ManualClock;
use crate::model::{Level, LevelContent, LevelId, ScoreDraft, ScoreEntry, ScoreId, UserId};
use crate::replay::{FRAMES_PER_SECOND, InputFrame, ReplayHeader, ReplayRecord, decode, encode};
use crate::store::{LedgerStore, MemoryStore, StoreError, StoreResult};

// ============================================================================
// Time
// ============================================================================

/// 2024-01-01T00:00:00Z
pub const TEST_EPOCH: i64 = 1_704_067_200;

pub fn test_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(at(0)))
}

/// `secs` seconds after [`TEST_EPOCH`].
pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(TEST_EPOCH + secs, 0).unwrap()
}

// ============================================================================
// Replays
// ============================================================================

/// Raw replay bytes declaring `declared` seconds over `frames` input frames.
///
/// The encoder pads to whole groups, so the recorded count rounds up to a
/// multiple of four.
pub fn replay_bytes(level_id: i32, declared: f32, frames: usize) -> Vec<u8> {
    let header = ReplayHeader {
        format_version: "v1".to_string(),
        level_id,
        created_at: TEST_EPOCH as i32,
        player_name: "tester".to_string(),
        used_alt_controls: false,
        elapsed_time: declared,
    };
    let inputs: Vec<InputFrame> = (0..frames)
        .map(|i| {
            if i % 7 == 0 {
                InputFrame::RIGHT | InputFrame::JUMP
            } else {
                InputFrame::RIGHT
            }
        })
        .collect();
    encode(&header, &inputs).unwrap()
}

/// A consistent replay finishing `level` in `time` seconds.
pub fn replay_for(level: LevelId, time: f32) -> ReplayRecord {
    replay_with_level(level.get() as i32, time)
}

pub fn replay_with_level(level_id: i32, time: f32) -> ReplayRecord {
    let frames = (time * FRAMES_PER_SECOND as f32).round() as usize;
    decode(&replay_bytes(level_id, time, frames)).unwrap()
}

// ============================================================================
// Levels
// ============================================================================

/// Valid level code: 1024 cells mixing empty cells and three-digit tiles.
pub fn sample_code() -> String {
    (0..1024)
        .map(|i| if i % 32 == 0 { "101" } else { "/" })
        .collect()
}

pub fn sample_content(title: &str) -> LevelContent {
    LevelContent {
        code: sample_code(),
        title: title.to_string(),
        description: format!("{title} description"),
    }
}

// ============================================================================
// Faulty store
// ============================================================================

/// [`MemoryStore`] wrapper whose writes can be made to fail on demand.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: MemoryStore,
    pub fail_link: AtomicBool,
    pub fail_insert: AtomicBool,
    pub overwrite_on_lookup: AtomicBool,
}

impl FaultyStore {
    pub fn fail_link(&self, fail: bool) {
        self.fail_link.store(fail, Ordering::SeqCst);
    }

    pub fn fail_insert(&self, fail: bool) {
        self.fail_insert.store(fail, Ordering::SeqCst);
    }

    /// Make the next `current_score` lookup bump the level's version first,
    /// as an overwrite landing in the middle of a submission would.
    pub fn overwrite_on_lookup(&self, overwrite: bool) {
        self.overwrite_on_lookup.store(overwrite, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, what: &str) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{what} injected failure")));
        }
        Ok(())
    }
}

impl LedgerStore for FaultyStore {
    fn level(&self, id: LevelId) -> StoreResult<Option<Level>> {
        self.inner.level(id)
    }

    fn level_by_title(&self, title: &str) -> StoreResult<Option<Level>> {
        self.inner.level_by_title(title)
    }

    fn create_level(
        &self,
        author: UserId,
        content: &LevelContent,
        at: DateTime<Utc>,
    ) -> StoreResult<Level> {
        self.inner.create_level(author, content, at)
    }

    fn advance_level(
        &self,
        id: LevelId,
        expected_version: u32,
        content: &LevelContent,
        at: DateTime<Utc>,
    ) -> StoreResult<Level> {
        self.inner.advance_level(id, expected_version, content, at)
    }

    fn link_verification(&self, id: LevelId, version: u32, score: ScoreId) -> StoreResult<Level> {
        Self::check(&self.fail_link, "link")?;
        self.inner.link_verification(id, version, score)
    }

    fn latest_publish_at(&self, author: UserId) -> StoreResult<Option<DateTime<Utc>>> {
        self.inner.latest_publish_at(author)
    }

    fn score(&self, id: ScoreId) -> StoreResult<Option<ScoreEntry>> {
        self.inner.score(id)
    }

    fn current_score(&self, user: UserId, level: LevelId) -> StoreResult<Option<ScoreEntry>> {
        if self.overwrite_on_lookup.swap(false, Ordering::SeqCst) {
            if let Some(stored) = self.inner.level(level)? {
                let content = LevelContent {
                    code: stored.code,
                    title: stored.title,
                    description: stored.description,
                };
                self.inner
                    .advance_level(level, stored.version, &content, stored.updated_at)?;
            }
        }
        self.inner.current_score(user, level)
    }

    fn insert_score(&self, draft: ScoreDraft, at: DateTime<Utc>) -> StoreResult<ScoreEntry> {
        Self::check(&self.fail_insert, "insert")?;
        self.inner.insert_score(draft, at)
    }

    fn improve_score(
        &self,
        id: ScoreId,
        draft: ScoreDraft,
        at: DateTime<Utc>,
    ) -> StoreResult<ScoreEntry> {
        self.inner.improve_score(id, draft, at)
    }

    fn set_hidden(&self, id: ScoreId, hidden: bool) -> StoreResult<ScoreEntry> {
        self.inner.set_hidden(id, hidden)
    }

    fn level_scores(&self, level: LevelId) -> StoreResult<Vec<ScoreEntry>> {
        self.inner.level_scores(level)
    }

    fn purge_superseded(&self, level: LevelId, current_version: u32) -> StoreResult<usize> {
        self.inner.purge_superseded(level, current_version)
    }
}
