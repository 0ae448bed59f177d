//! Wiring of the ledger components over one store.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::leaderboard::LeaderboardView;
use crate::ledger::ScoreLedger;
use crate::levels::LevelVersionManager;
use crate::replay::{DecodeError, ReplayRecord, decode_with};
use crate::store::{LedgerStore, MemoryStore, StoreError};

/// The ledger, level manager and leaderboard sharing one store and clock,
/// configured from a [`Config`].
pub struct Engine<S> {
    config: Config,
    store: Arc<S>,
    ledger: Arc<ScoreLedger<S>>,
    levels: LevelVersionManager<S>,
    leaderboard: LeaderboardView<S>,
}

impl<S: LedgerStore> Engine<S> {
    pub fn new(config: Config, store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        let retention = config.storage.retention;
        let ledger = Arc::new(
            ScoreLedger::new(Arc::clone(&store), Arc::clone(&clock))
                .with_decode_options(config.replay.decode_options())
                .with_retention(retention),
        );
        let levels = LevelVersionManager::new(Arc::clone(&store), Arc::clone(&ledger), clock)
            .with_config(config.publish.clone())
            .with_retention(retention);
        let leaderboard =
            LeaderboardView::new(Arc::clone(&store)).with_config(config.leaderboard.clone());

        Self {
            config,
            store,
            ledger,
            levels,
            leaderboard,
        }
    }

    /// Decode replay bytes with the configured tolerance.
    pub fn decode(&self, bytes: &[u8]) -> Result<ReplayRecord, DecodeError> {
        decode_with(bytes, &self.config.replay.decode_options())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn ledger(&self) -> &ScoreLedger<S> {
        &self.ledger
    }

    pub fn levels(&self) -> &LevelVersionManager<S> {
        &self.levels
    }

    pub fn leaderboard(&self) -> &LeaderboardView<S> {
        &self.leaderboard
    }
}

impl Engine<MemoryStore> {
    /// Engine over the snapshot file named by the config, on wall-clock time.
    pub fn open(config: Config) -> Result<Self, StoreError> {
        let store = match config.snapshot_path() {
            Some(path) => MemoryStore::open(path)?,
            None => {
                tracing::warn!("no data directory; ledger will not be persisted");
                MemoryStore::new()
            }
        };
        Ok(Self::new(config, Arc::new(store), Arc::new(SystemClock)))
    }

    /// Persist the store's snapshot, if it has a file.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.store.flush()
    }
}
