//! In-memory ledger store with an optional JSON snapshot file.

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::{LedgerStore, StoreError, StoreResult};
use crate::model::{Level, LevelContent, LevelId, ScoreDraft, ScoreEntry, ScoreId, UserId};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Default)]
struct State {
    levels: HashMap<LevelId, Level>,
    titles: HashMap<String, LevelId>,
    scores: HashMap<ScoreId, ScoreEntry>,
    current: HashMap<(UserId, LevelId), ScoreId>,
    next_level_id: u32,
    next_score_id: u32,
    dirty: bool,
}

/// On-disk form of [`State`]; map indices are rebuilt on load.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    next_level_id: u32,
    next_score_id: u32,
    levels: Vec<Level>,
    scores: Vec<ScoreEntry>,
    current: Vec<ScoreId>,
}

/// Ledger state held in memory behind a single lock.
pub struct MemoryStore {
    path: Option<PathBuf>,
    state: RwLock<State>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store with no backing file.
    pub fn new() -> Self {
        Self {
            path: None,
            state: RwLock::new(State {
                next_level_id: 1,
                next_score_id: 1,
                ..State::default()
            }),
        }
    }

    /// Load the snapshot at `path`, or start empty if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let mut store = Self::new();

        match fs::read(&path) {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
                if snapshot.version != SNAPSHOT_VERSION {
                    return Err(StoreError::Unavailable(format!(
                        "unsupported snapshot version {}",
                        snapshot.version
                    )));
                }
                *store.state.get_mut() = State::from_snapshot(snapshot);
                tracing::debug!(path = %path.display(), "ledger snapshot loaded");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        store.path = Some(path);
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the snapshot file if anything changed since the last flush.
    pub fn flush(&self) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut state = self.state.write();
        if !state.dirty {
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = match path.file_name() {
            Some(name) => {
                let mut tmp_name = OsString::from(name);
                tmp_name.push(".tmp");
                path.with_file_name(tmp_name)
            }
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "snapshot path has no file name",
                )
                .into());
            }
        };

        let out = serde_json::to_vec_pretty(&state.to_snapshot())?;
        {
            let mut f = fs::File::create(&tmp_path)?;
            f.write_all(&out)?;
            f.sync_all()?;
        }

        #[cfg(windows)]
        {
            if path.exists() {
                // Windows rename fails if destination exists.
                fs::remove_file(path)?;
            }
        }

        fs::rename(&tmp_path, path)?;
        state.dirty = false;
        Ok(())
    }
}

impl State {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut state = State {
            next_level_id: snapshot.next_level_id,
            next_score_id: snapshot.next_score_id,
            ..State::default()
        };
        for level in snapshot.levels {
            state.titles.insert(level.title.clone(), level.id);
            state.levels.insert(level.id, level);
        }
        for score in snapshot.scores {
            state.scores.insert(score.id, score);
        }
        for id in snapshot.current {
            if let Some(score) = state.scores.get(&id) {
                state.current.insert((score.user_id, score.level_id), id);
            }
        }
        state
    }

    fn to_snapshot(&self) -> Snapshot {
        let mut levels: Vec<Level> = self.levels.values().cloned().collect();
        levels.sort_by_key(|l| l.id);
        let mut scores: Vec<ScoreEntry> = self.scores.values().cloned().collect();
        scores.sort_by_key(|s| s.id);
        let mut current: Vec<ScoreId> = self.current.values().copied().collect();
        current.sort();
        Snapshot {
            version: SNAPSHOT_VERSION,
            next_level_id: self.next_level_id,
            next_score_id: self.next_score_id,
            levels,
            scores,
            current,
        }
    }

    fn level_mut(&mut self, id: LevelId) -> StoreResult<&mut Level> {
        self.levels.get_mut(&id).ok_or(StoreError::LevelNotFound(id))
    }

    /// Scores may only be written against the level's current version.
    fn check_current_version(&self, level_id: LevelId, version: u32) -> StoreResult<()> {
        let level = self
            .levels
            .get(&level_id)
            .ok_or(StoreError::LevelNotFound(level_id))?;
        if level.version != version {
            return Err(StoreError::VersionConflict {
                level_id,
                expected: version,
                actual: level.version,
            });
        }
        Ok(())
    }

    fn check_title_free(&self, title: &str, owner: Option<LevelId>) -> StoreResult<()> {
        match self.titles.get(title) {
            Some(&level_id) if Some(level_id) != owner => Err(StoreError::TitleTaken {
                title: title.to_string(),
                level_id,
            }),
            _ => Ok(()),
        }
    }
}

impl LedgerStore for MemoryStore {
    fn level(&self, id: LevelId) -> StoreResult<Option<Level>> {
        Ok(self.state.read().levels.get(&id).cloned())
    }

    fn level_by_title(&self, title: &str) -> StoreResult<Option<Level>> {
        let state = self.state.read();
        Ok(state
            .titles
            .get(title)
            .and_then(|id| state.levels.get(id))
            .cloned())
    }

    fn create_level(
        &self,
        author: UserId,
        content: &LevelContent,
        at: DateTime<Utc>,
    ) -> StoreResult<Level> {
        let mut state = self.state.write();
        state.check_title_free(&content.title, None)?;

        let id = LevelId(state.next_level_id);
        state.next_level_id += 1;
        let level = Level {
            id,
            author_id: author,
            code: content.code.clone(),
            title: content.title.clone(),
            description: content.description.clone(),
            version: 1,
            verification_score_id: None,
            created_at: at,
            updated_at: at,
        };
        state.titles.insert(level.title.clone(), id);
        state.levels.insert(id, level.clone());
        state.dirty = true;
        Ok(level)
    }

    fn advance_level(
        &self,
        id: LevelId,
        expected_version: u32,
        content: &LevelContent,
        at: DateTime<Utc>,
    ) -> StoreResult<Level> {
        let mut state = self.state.write();
        state.check_title_free(&content.title, Some(id))?;

        let level = state.level_mut(id)?;
        if level.version != expected_version {
            return Err(StoreError::VersionConflict {
                level_id: id,
                expected: expected_version,
                actual: level.version,
            });
        }

        let old_title = std::mem::replace(&mut level.title, content.title.clone());
        level.code = content.code.clone();
        level.description = content.description.clone();
        level.version = expected_version + 1;
        level.verification_score_id = None;
        level.updated_at = at;
        let level = level.clone();

        if old_title != level.title {
            state.titles.remove(&old_title);
            state.titles.insert(level.title.clone(), id);
        }
        state.dirty = true;
        Ok(level)
    }

    fn link_verification(&self, id: LevelId, version: u32, score: ScoreId) -> StoreResult<Level> {
        let mut state = self.state.write();
        let entry = state
            .scores
            .get(&score)
            .ok_or(StoreError::ScoreNotFound(score))?;
        let entry_matches = entry.level_id == id && entry.level_version == version;

        let level = state.level_mut(id)?;
        if level.version != version || !entry_matches {
            return Err(StoreError::VerificationMismatch {
                level_id: id,
                version,
                score_id: score,
            });
        }
        level.verification_score_id = Some(score);
        let level = level.clone();
        state.dirty = true;
        Ok(level)
    }

    fn latest_publish_at(&self, author: UserId) -> StoreResult<Option<DateTime<Utc>>> {
        Ok(self
            .state
            .read()
            .levels
            .values()
            .filter(|l| l.author_id == author)
            .map(|l| l.updated_at)
            .max())
    }

    fn score(&self, id: ScoreId) -> StoreResult<Option<ScoreEntry>> {
        Ok(self.state.read().scores.get(&id).cloned())
    }

    fn current_score(&self, user: UserId, level: LevelId) -> StoreResult<Option<ScoreEntry>> {
        let state = self.state.read();
        Ok(state
            .current
            .get(&(user, level))
            .and_then(|id| state.scores.get(id))
            .cloned())
    }

    fn insert_score(&self, draft: ScoreDraft, at: DateTime<Utc>) -> StoreResult<ScoreEntry> {
        let mut state = self.state.write();
        state.check_current_version(draft.level_id, draft.level_version)?;
        let id = ScoreId(state.next_score_id);
        state.next_score_id += 1;

        let entry = ScoreEntry {
            id,
            user_id: draft.user_id,
            level_id: draft.level_id,
            level_version: draft.level_version,
            elapsed_time: draft.elapsed_time,
            replay_bytes: draft.replay_bytes,
            format_version: draft.format_version,
            used_alt_controls: draft.used_alt_controls,
            hidden: false,
            created_at: at,
            updated_at: at,
        };
        state.current.insert((entry.user_id, entry.level_id), id);
        state.scores.insert(id, entry.clone());
        state.dirty = true;
        Ok(entry)
    }

    fn improve_score(
        &self,
        id: ScoreId,
        draft: ScoreDraft,
        at: DateTime<Utc>,
    ) -> StoreResult<ScoreEntry> {
        let mut state = self.state.write();
        state.check_current_version(draft.level_id, draft.level_version)?;
        let entry = state
            .scores
            .get_mut(&id)
            .ok_or(StoreError::ScoreNotFound(id))?;

        entry.level_version = draft.level_version;
        entry.elapsed_time = draft.elapsed_time;
        entry.replay_bytes = draft.replay_bytes;
        entry.format_version = draft.format_version;
        entry.used_alt_controls = draft.used_alt_controls;
        entry.updated_at = at;
        let entry = entry.clone();
        state.dirty = true;
        Ok(entry)
    }

    fn set_hidden(&self, id: ScoreId, hidden: bool) -> StoreResult<ScoreEntry> {
        let mut state = self.state.write();
        let entry = state
            .scores
            .get_mut(&id)
            .ok_or(StoreError::ScoreNotFound(id))?;
        entry.hidden = hidden;
        let entry = entry.clone();
        state.dirty = true;
        Ok(entry)
    }

    fn level_scores(&self, level: LevelId) -> StoreResult<Vec<ScoreEntry>> {
        let mut scores: Vec<ScoreEntry> = self
            .state
            .read()
            .scores
            .values()
            .filter(|s| s.level_id == level)
            .cloned()
            .collect();
        scores.sort_by_key(|s| s.id);
        Ok(scores)
    }

    fn purge_superseded(&self, level: LevelId, current_version: u32) -> StoreResult<usize> {
        let mut state = self.state.write();
        let before = state.scores.len();
        state
            .scores
            .retain(|_, s| s.level_id != level || s.level_version >= current_version);
        let purged = before - state.scores.len();

        let State {
            scores, current, ..
        } = &mut *state;
        current.retain(|_, id| scores.contains_key(id));

        if purged > 0 {
            state.dirty = true;
        }
        Ok(purged)
    }
}
