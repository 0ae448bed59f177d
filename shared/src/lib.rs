//! Shared types for the tilerun replay verification and score ledger.
//!
//! These are the plain data records handed to collaborators (the HTTP layer,
//! the level-management subsystem, the CLI). Nothing in here performs I/O.

pub mod api;
pub mod error;
pub mod ids;
pub mod requests;

pub use api::{LevelResponse, RecordStub, ScoreResponse, ScoresPage, UploadReplayResponse};
pub use error::{ApiError, error_codes};
pub use ids::{LevelId, ScoreId, UserId};
pub use requests::{PublishLevelRequest, ScoreSearchRequest, UploadReplayRequest};

/// Cursor value signalling that a paginated listing is exhausted.
pub const END_CURSOR: i64 = -1;
