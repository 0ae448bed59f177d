//! Conversions from ledger records and errors to the shared wire types.

use tilerun_shared::{
    ApiError, END_CURSOR, LevelResponse, RecordStub, ScoreResponse, ScoresPage,
    UploadReplayResponse, error_codes,
};

use crate::leaderboard::{LevelSummary, Page, RankError};
use crate::ledger::{AccessError, Submission, SubmissionError};
use crate::levels::PublishError;
use crate::model::ScoreEntry;
use crate::replay::{DecodeError, encode_b64};
use crate::store::StoreError;

impl From<&ScoreEntry> for ScoreResponse {
    fn from(entry: &ScoreEntry) -> Self {
        Self {
            id: entry.id,
            user: entry.user_id,
            level_id: entry.level_id,
            time: entry.elapsed_time,
            version: entry.format_version.clone(),
            raw: encode_b64(&entry.replay_bytes),
            created_at: entry.created_at.timestamp_millis(),
            updated_at: entry.updated_at.timestamp_millis(),
            alt: entry.used_alt_controls,
            level_version: entry.level_version,
            hidden: entry.hidden,
        }
    }
}

impl From<&ScoreEntry> for RecordStub {
    fn from(entry: &ScoreEntry) -> Self {
        Self {
            user: entry.user_id,
            time: entry.elapsed_time,
            version: entry.level_version,
        }
    }
}

impl From<&Page> for ScoresPage {
    fn from(page: &Page) -> Self {
        Self {
            scores: page.entries.iter().map(ScoreResponse::from).collect(),
            cursor: page
                .next_cursor
                .map_or(END_CURSOR, |id| i64::from(id.get())),
        }
    }
}

impl From<&LevelSummary> for LevelResponse {
    fn from(summary: &LevelSummary) -> Self {
        let level = &summary.level;
        Self {
            id: level.id,
            code: level.code.clone(),
            author_id: level.author_id,
            title: level.title.clone(),
            description: level.description.clone(),
            created_at: level.created_at.timestamp_millis(),
            updated_at: level.updated_at.timestamp_millis(),
            record: summary.record.as_ref().map(RecordStub::from),
            my_record: summary.my_record.as_ref().map(RecordStub::from),
            records: u32::try_from(summary.records).unwrap_or(u32::MAX),
            verification_id: level.verification_score_id,
            version: level.version,
        }
    }
}

impl From<&Submission> for UploadReplayResponse {
    fn from(submission: &Submission) -> Self {
        Self {
            new_best: submission.entry.elapsed_time,
        }
    }
}

fn storage(e: &StoreError) -> ApiError {
    match e {
        StoreError::LevelNotFound(_) | StoreError::ScoreNotFound(_) => {
            ApiError::new(error_codes::NOT_FOUND, e.to_string())
        }
        StoreError::VersionConflict { .. } | StoreError::TitleTaken { .. } => {
            ApiError::new(error_codes::CONFLICT, e.to_string())
        }
        _ => ApiError::new(error_codes::INTERNAL, e.to_string()),
    }
}

impl From<&DecodeError> for ApiError {
    fn from(e: &DecodeError) -> Self {
        ApiError::new(error_codes::VALIDATION_ERROR, e.to_string())
    }
}

impl From<&SubmissionError> for ApiError {
    fn from(e: &SubmissionError) -> Self {
        match e {
            SubmissionError::UnknownLevel(_) => ApiError::new(error_codes::NOT_FOUND, e.to_string()),
            SubmissionError::Unpublished(_) | SubmissionError::InvalidReplay(_) => {
                ApiError::new(error_codes::VALIDATION_ERROR, e.to_string())
            }
            SubmissionError::VersionMismatch { .. } => {
                ApiError::new(error_codes::CONFLICT, e.to_string())
            }
            SubmissionError::Storage(inner) => storage(inner),
        }
    }
}

impl From<&AccessError> for ApiError {
    fn from(e: &AccessError) -> Self {
        match e {
            AccessError::NotFound(_) => ApiError::new(error_codes::NOT_FOUND, e.to_string()),
            AccessError::Forbidden(_) => ApiError::new(error_codes::FORBIDDEN, e.to_string()),
            AccessError::Storage(inner) => storage(inner),
        }
    }
}

impl From<&PublishError> for ApiError {
    fn from(e: &PublishError) -> Self {
        let code = match e {
            PublishError::InvalidContent(_) | PublishError::InvalidReplay(_) => {
                error_codes::VALIDATION_ERROR
            }
            PublishError::UnknownLevel(_) => error_codes::NOT_FOUND,
            PublishError::Conflict { .. } | PublishError::TitleTaken { .. } => {
                error_codes::CONFLICT
            }
            PublishError::Forbidden(_) => error_codes::FORBIDDEN,
            PublishError::TooFrequent { .. } => error_codes::TOO_MANY_REQUESTS,
            PublishError::VerificationLinkFailed { source, .. } => match source {
                SubmissionError::InvalidReplay(_) => error_codes::VALIDATION_ERROR,
                _ => error_codes::INTERNAL,
            },
            PublishError::Storage(inner) => return storage(inner),
        };
        ApiError::new(code, e.to_string())
    }
}

impl From<&RankError> for ApiError {
    fn from(e: &RankError) -> Self {
        match e {
            RankError::UnknownLevel(_) => ApiError::new(error_codes::NOT_FOUND, e.to_string()),
            RankError::InvalidLimit { .. }
            | RankError::InvalidCursor(_)
            | RankError::UnknownSortKey(_)
            | RankError::UnknownOrder(_) => {
                ApiError::new(error_codes::VALIDATION_ERROR, e.to_string())
            }
            RankError::Storage(inner) => storage(inner),
        }
    }
}
