//! Tilerun Core - replay verification and score ledger
//!
//! This crate checks uploaded replays and keeps the per-level record books
//! built from them.
//!
//! # Architecture
//!
//! - [`replay`] - Decoding, encoding and playback of the binary replay format
//! - [`ScoreLedger`] - One authoritative score per (user, level), replaced on strict improvement
//! - [`LevelVersionManager`] - Level publication, versioning and verification anchors
//! - [`LeaderboardView`] - Cursor-paginated ranking of current-version scores
//! - [`LedgerStore`] - Storage seam, with the in-memory [`MemoryStore`]
//! - [`Engine`] - All of the above wired from a [`Config`]

pub mod clock;
pub mod config;
pub mod engine;
#[cfg(test)]
mod integration;
pub mod leaderboard;
pub mod ledger;
pub mod levels;
pub mod model;
pub mod replay;
pub mod response;
pub mod store;
pub mod sync;
#[cfg(test)]
pub mod test_utils;

// Re-export components
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ConfigError, RetentionPolicy};
pub use engine::Engine;
pub use leaderboard::{LeaderboardView, LevelSummary, Order, Page, RankError, RankQuery, SortKey};
pub use ledger::{AccessError, ScoreLedger, Submission, SubmissionError, SubmitOutcome};
pub use levels::{ContentError, LevelVersionManager, PublishError, validate_content};
pub use store::{LedgerStore, MemoryStore, StoreError};

// Re-export records
pub use model::{Level, LevelContent, LevelId, ScoreDraft, ScoreEntry, ScoreId, UserId};

// Re-export replay types
pub use replay::{
    DecodeError, DecodeOptions, EncodeError, InputFrame, Playback, ReplayHeader, ReplayRecord,
    decode, decode_b64, encode, encode_b64,
};
