//! Leaderboard command

use anyhow::Result;
use clap::Args;

use tilerun_core::{LevelId, RankQuery, UserId};
use tilerun_shared::{END_CURSOR, ScoreSearchRequest, ScoresPage};

use crate::ledger::{LedgerArgs, api_error, print_json};

/// Arguments for the leaderboard command
#[derive(Args)]
pub struct LeaderboardArgs {
    /// Level id
    pub level: u32,

    /// Requesting user; their hidden scores are included
    #[arg(long)]
    pub user: Option<u32>,

    /// Sort key: time, user, createdAt or updatedAt
    #[arg(long, default_value = "time")]
    pub sort: String,

    /// Sort order: asc or desc
    #[arg(long, default_value = "asc")]
    pub order: String,

    /// Id of the last entry of the previous page
    #[arg(long, default_value_t = END_CURSOR, allow_negative_numbers = true)]
    pub cursor: i64,

    /// Page size (default: configured page size)
    #[arg(long)]
    pub limit: Option<u32>,
}

/// Execute the leaderboard command
pub fn execute(args: LeaderboardArgs, ledger: &LedgerArgs) -> Result<()> {
    let engine = ledger.open()?;
    let request = ScoreSearchRequest {
        cursor: args.cursor,
        limit: args
            .limit
            .unwrap_or(engine.config().leaderboard.default_page_size),
        sort_by: args.sort,
        order: args.order,
    };

    let query = RankQuery::from_request(LevelId(args.level), args.user.map(UserId), &request)
        .map_err(api_error)?;
    let page = engine.leaderboard().rank(&query).map_err(api_error)?;
    print_json(&ScoresPage::from(&page))
}
