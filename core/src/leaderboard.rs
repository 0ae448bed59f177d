//! Leaderboard view
//!
//! Ranks the entries contending on a level's current version. Entries left
//! behind by an overwrite stay in storage but never rank, and hidden entries
//! are shown to their owner only.
//!
//! Pages are keyed by the id of the last entry of the previous page, so
//! entries inserted between requests do not shift later pages.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tilerun_shared::{END_CURSOR, ScoreSearchRequest};

use crate::config::LeaderboardConfig;
use crate::model::{Level, LevelId, ScoreEntry, ScoreId, UserId};
use crate::store::{LedgerStore, StoreError};

/// Field a leaderboard is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Time,
    User,
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortKey {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(SortKey::Time),
            "user" | "author" => Ok(SortKey::User),
            "createdAt" | "created_at" => Ok(SortKey::CreatedAt),
            "updatedAt" | "updated_at" => Ok(SortKey::UpdatedAt),
            _ => Err(RankError::UnknownSortKey(s.to_string())),
        }
    }
}

impl FromStr for Order {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Order::Asc),
            "desc" => Ok(Order::Desc),
            _ => Err(RankError::UnknownOrder(s.to_string())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortKey::Time => "time",
            SortKey::User => "user",
            SortKey::CreatedAt => "createdAt",
            SortKey::UpdatedAt => "updatedAt",
        })
    }
}

/// Reasons a ranking request is refused.
#[derive(Debug, thiserror::Error)]
pub enum RankError {
    #[error("level {0} does not exist")]
    UnknownLevel(LevelId),

    #[error("page size must be between 1 and {max}, got {limit}")]
    InvalidLimit { limit: u32, max: u32 },

    /// Cursor does not name an entry of this level
    #[error("cursor {0} is not an entry of this level")]
    InvalidCursor(i64),

    #[error("unknown sort key {0:?}")]
    UnknownSortKey(String),

    #[error("unknown order {0:?}")]
    UnknownOrder(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// A leaderboard request.
#[derive(Debug, Clone, PartialEq)]
pub struct RankQuery {
    pub level: LevelId,
    pub requester: Option<UserId>,
    pub sort: SortKey,
    pub order: Order,
    /// Last entry of the previous page
    pub cursor: Option<ScoreId>,
    /// Defaults to the configured page size
    pub limit: Option<u32>,
}

impl RankQuery {
    /// Fastest-first, first page, anonymous requester.
    pub fn new(level: LevelId) -> Self {
        Self {
            level,
            requester: None,
            sort: SortKey::default(),
            order: Order::default(),
            cursor: None,
            limit: None,
        }
    }

    pub fn requester(mut self, user: UserId) -> Self {
        self.requester = Some(user);
        self
    }

    pub fn sort_by(mut self, sort: SortKey, order: Order) -> Self {
        self.sort = sort;
        self.order = order;
        self
    }

    pub fn after(mut self, cursor: ScoreId) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Build a query from the wire request, where a cursor of `-1` means the
    /// first page.
    pub fn from_request(
        level: LevelId,
        requester: Option<UserId>,
        request: &ScoreSearchRequest,
    ) -> Result<Self, RankError> {
        let cursor = match request.cursor {
            END_CURSOR => None,
            raw => Some(
                u32::try_from(raw)
                    .map(ScoreId)
                    .map_err(|_| RankError::InvalidCursor(raw))?,
            ),
        };
        Ok(Self {
            level,
            requester,
            sort: request.sort_by.parse()?,
            order: request.order.parse()?,
            cursor,
            limit: Some(request.limit),
        })
    }

    /// Total order used for ranking: version (newest first), the requested
    /// key, then id.
    fn compare(&self, a: &ScoreEntry, b: &ScoreEntry) -> Ordering {
        let by_key = match self.sort {
            SortKey::Time => a.elapsed_time.total_cmp(&b.elapsed_time),
            SortKey::User => a.user_id.cmp(&b.user_id),
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };
        let by_key = match self.order {
            Order::Asc => by_key,
            Order::Desc => by_key.reverse(),
        };
        b.level_version
            .cmp(&a.level_version)
            .then(by_key)
            .then(a.id.cmp(&b.id))
    }
}

/// One page of ranked entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub entries: Vec<ScoreEntry>,
    /// `None` once the listing is exhausted
    pub next_cursor: Option<ScoreId>,
}

/// Ledger-derived facts about a level for one requester.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSummary {
    pub level: Level,
    /// Fastest visible entry on the current version
    pub record: Option<ScoreEntry>,
    /// Requester's own entry on the current version
    pub my_record: Option<ScoreEntry>,
    /// Visible entries on the current version
    pub records: usize,
}

/// Read-only ranking over a [`LedgerStore`].
pub struct LeaderboardView<S> {
    store: Arc<S>,
    config: LeaderboardConfig,
}

impl<S: LedgerStore> LeaderboardView<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: LeaderboardConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LeaderboardConfig) -> Self {
        self.config = config;
        self
    }

    /// One page of the level's current-version leaderboard.
    pub fn rank(&self, query: &RankQuery) -> Result<Page, RankError> {
        let limit = query.limit.unwrap_or(self.config.default_page_size);
        if limit == 0 || limit > self.config.max_page_size {
            return Err(RankError::InvalidLimit {
                limit,
                max: self.config.max_page_size,
            });
        }

        let (_, mut entries) = self.contenders(query.level, query.requester)?;
        entries.sort_by(|a, b| query.compare(a, b));

        if let Some(cursor) = query.cursor {
            let anchor = self
                .store
                .score(cursor)?
                .filter(|entry| entry.level_id == query.level)
                .ok_or(RankError::InvalidCursor(i64::from(cursor.get())))?;
            entries.retain(|entry| query.compare(entry, &anchor) == Ordering::Greater);
        }

        entries.truncate(limit as usize);
        let next_cursor = if entries.len() < limit as usize {
            None
        } else {
            entries.last().map(|entry| entry.id)
        };

        tracing::debug!(
            level = query.level.get(),
            sort = %query.sort,
            returned = entries.len(),
            "leaderboard page"
        );
        Ok(Page {
            entries,
            next_cursor,
        })
    }

    /// Record holder, the requester's standing and the contender count.
    pub fn summary(
        &self,
        level: LevelId,
        requester: Option<UserId>,
    ) -> Result<LevelSummary, RankError> {
        let (level, entries) = self.contenders(level, requester)?;

        let record = entries
            .iter()
            .min_by(|a, b| a.elapsed_time.total_cmp(&b.elapsed_time).then(a.id.cmp(&b.id)))
            .cloned();
        let my_record = requester
            .and_then(|user| entries.iter().find(|entry| entry.user_id == user))
            .cloned();

        Ok(LevelSummary {
            records: entries.len(),
            level,
            record,
            my_record,
        })
    }

    /// The level plus its current-version entries visible to `requester`.
    fn contenders(
        &self,
        level: LevelId,
        requester: Option<UserId>,
    ) -> Result<(Level, Vec<ScoreEntry>), RankError> {
        let level = self
            .store
            .level(level)?
            .ok_or(RankError::UnknownLevel(level))?;
        let entries = self
            .store
            .level_scores(level.id)?
            .into_iter()
            .filter(|entry| entry.contends_on(&level) && entry.visible_to(requester))
            .collect();
        Ok((level, entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_utils::{at, sample_content};
    use crate::model::ScoreDraft;

    fn draft(user: u32, level: LevelId, version: u32, time: f32) -> ScoreDraft {
        ScoreDraft {
            user_id: UserId(user),
            level_id: level,
            level_version: version,
            elapsed_time: time,
            replay_bytes: Vec::new(),
            format_version: "v1".to_string(),
            used_alt_controls: false,
        }
    }

    fn board(times: &[f32]) -> (LeaderboardView<MemoryStore>, LevelId) {
        let store = Arc::new(MemoryStore::new());
        let level = store
            .create_level(UserId(100), &sample_content("Board"), at(0))
            .unwrap();
        for (i, &time) in times.iter().enumerate() {
            store
                .insert_score(draft(i as u32 + 1, level.id, 1, time), at(i as i64))
                .unwrap();
        }
        (LeaderboardView::new(store), level.id)
    }

    fn users(page: &Page) -> Vec<u32> {
        page.entries.iter().map(|e| e.user_id.get()).collect()
    }

    #[test]
    fn sorts_by_time_then_id() {
        let (view, level) = board(&[12.4, 11.9, 12.4, 3.0]);
        let page = view.rank(&RankQuery::new(level)).unwrap();
        assert_eq!(users(&page), vec![4, 2, 1, 3]);
        assert_eq!(page.next_cursor, None);

        let page = view
            .rank(&RankQuery::new(level).sort_by(SortKey::Time, Order::Desc))
            .unwrap();
        assert_eq!(users(&page), vec![1, 3, 2, 4]);
    }

    #[test]
    fn other_sort_keys() {
        let (view, level) = board(&[5.0, 4.0, 3.0]);
        let by_user = view
            .rank(&RankQuery::new(level).sort_by(SortKey::User, Order::Desc))
            .unwrap();
        assert_eq!(users(&by_user), vec![3, 2, 1]);

        let by_created = view
            .rank(&RankQuery::new(level).sort_by(SortKey::CreatedAt, Order::Asc))
            .unwrap();
        assert_eq!(users(&by_created), vec![1, 2, 3]);
    }

    #[test]
    fn cursor_pages_through_everything() {
        let times: Vec<f32> = (0..7).map(|i| 10.0 - i as f32).collect();
        let (view, level) = board(&times);

        let mut seen = Vec::new();
        let mut query = RankQuery::new(level).limit(3);
        loop {
            let page = view.rank(&query).unwrap();
            seen.extend(users(&page));
            match page.next_cursor {
                Some(cursor) => query = query.after(cursor),
                None => break,
            }
        }
        assert_eq!(seen, vec![7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn full_last_page_is_followed_by_empty_page() {
        let (view, level) = board(&[1.0, 2.0]);
        let page = view.rank(&RankQuery::new(level).limit(2)).unwrap();
        let cursor = page.next_cursor.unwrap();
        let page = view.rank(&RankQuery::new(level).limit(2).after(cursor)).unwrap();
        assert!(page.entries.is_empty());
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn limits_are_checked() {
        let (view, level) = board(&[1.0]);
        assert!(matches!(
            view.rank(&RankQuery::new(level).limit(0)),
            Err(RankError::InvalidLimit { limit: 0, max: 20 })
        ));
        assert!(matches!(
            view.rank(&RankQuery::new(level).limit(21)),
            Err(RankError::InvalidLimit { limit: 21, .. })
        ));
        assert!(matches!(
            view.rank(&RankQuery::new(LevelId(77))),
            Err(RankError::UnknownLevel(LevelId(77)))
        ));
        assert!(matches!(
            view.rank(&RankQuery::new(level).after(ScoreId(999))),
            Err(RankError::InvalidCursor(999))
        ));
    }

    #[test]
    fn hidden_entries_visible_to_owner_only() {
        let (view, level) = board(&[1.0, 2.0]);
        let first = view.rank(&RankQuery::new(level)).unwrap().entries[0].clone();
        view.store.set_hidden(first.id, true).unwrap();

        assert_eq!(users(&view.rank(&RankQuery::new(level)).unwrap()), vec![2]);
        assert_eq!(
            users(&view.rank(&RankQuery::new(level).requester(UserId(2))).unwrap()),
            vec![2]
        );
        assert_eq!(
            users(&view.rank(&RankQuery::new(level).requester(UserId(1))).unwrap()),
            vec![1, 2]
        );
    }

    #[test]
    fn summary_counts_current_version_only() {
        let (view, level) = board(&[4.0, 3.0]);
        view.store
            .advance_level(level, 1, &sample_content("Board"), at(50))
            .unwrap();
        view.store.insert_score(draft(1, level, 2, 9.0), at(60)).unwrap();

        let summary = view.summary(level, Some(UserId(2))).unwrap();
        assert_eq!(summary.level.version, 2);
        assert_eq!(summary.records, 1);
        assert_eq!(summary.record.map(|e| e.user_id), Some(UserId(1)));
        assert_eq!(summary.my_record, None);
    }

    #[test]
    fn wire_request_parsing() {
        let request = ScoreSearchRequest {
            cursor: 5,
            limit: 10,
            sort_by: "createdAt".to_string(),
            order: "desc".to_string(),
        };
        let query = RankQuery::from_request(LevelId(1), None, &request).unwrap();
        assert_eq!(query.cursor, Some(ScoreId(5)));
        assert_eq!(query.sort, SortKey::CreatedAt);
        assert_eq!(query.order, Order::Desc);

        let first = RankQuery::from_request(LevelId(1), None, &ScoreSearchRequest::default())
            .unwrap();
        assert_eq!(first.cursor, None);
        assert_eq!(first.sort, SortKey::Time);

        let bad = ScoreSearchRequest {
            sort_by: "speed".to_string(),
            ..ScoreSearchRequest::default()
        };
        assert!(matches!(
            RankQuery::from_request(LevelId(1), None, &bad),
            Err(RankError::UnknownSortKey(_))
        ));
        let bad = ScoreSearchRequest {
            cursor: -7,
            ..ScoreSearchRequest::default()
        };
        assert!(matches!(
            RankQuery::from_request(LevelId(1), None, &bad),
            Err(RankError::InvalidCursor(-7))
        ));
    }
}
