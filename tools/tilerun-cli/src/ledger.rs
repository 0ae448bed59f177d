//! Opening the ledger for CLI commands

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use tilerun_core::{Config, Engine, MemoryStore, config};
use tilerun_shared::ApiError;

/// Options shared by every command that touches the ledger
#[derive(Args, Debug, Default)]
pub struct LedgerArgs {
    /// Config file (default: config.toml in the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Ledger snapshot file, overriding the configured one
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
}

impl LedgerArgs {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => config::load_from(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => config::load().context("Failed to load config")?,
        };
        if let Some(store) = &self.store {
            config.storage.snapshot_path = Some(store.clone());
        }
        Ok(config)
    }

    pub fn open(&self) -> Result<Engine<MemoryStore>> {
        let config = self.load_config()?;
        let path = config.snapshot_path();
        let engine = Engine::open(config).with_context(|| match &path {
            Some(path) => format!("Failed to open ledger: {}", path.display()),
            None => "Failed to open ledger".to_string(),
        })?;
        tracing::debug!(store = ?engine.store().path(), "ledger opened");
        Ok(engine)
    }
}

/// Turn a ledger error into the API error clients would see.
pub fn api_error<E>(e: E) -> anyhow::Error
where
    for<'a> ApiError: From<&'a E>,
{
    anyhow::Error::new(ApiError::from(&e))
}

/// Save whatever the ledger committed, then report the operation's outcome.
///
/// A failed operation may still have written state (a publish whose
/// verification link failed keeps the unverified level).
pub fn settle<T, E>(engine: &Engine<MemoryStore>, result: Result<T, E>) -> Result<T>
where
    for<'a> ApiError: From<&'a E>,
{
    engine.flush().context("Failed to save ledger")?;
    result.map_err(api_error)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
