//! Integration tests for the tilerun ledger
//!
//! Drives publication, submission and ranking together through an
//! [`Engine`](crate::Engine) on a manual clock.


#[cfg(test)]
pub(crate) mod test_utils {
    use chrono::TimeDelta;
    use std::sync::Arc;

    use crate::{
        Config, Engine, Level, LevelId, ManualClock, MemoryStore, RankQuery, ScoreEntry, UserId,
        test_utils::{replay_for, replay_with_level, sample_content, test_clock},
    };

    pub struct Harness {
        pub clock: Arc<ManualClock>,
        pub engine: Engine<MemoryStore>,
    }

    pub fn harness() -> Harness {
        harness_with(Config::default())
    }

    pub fn harness_with(config: Config) -> Harness {
        let clock = test_clock();
        let engine = Engine::new(config, Arc::new(MemoryStore::new()), clock.clone());
        Harness { clock, engine }
    }

    impl Harness {
        /// Publish a new level, then let the author's cooldown run out.
        pub fn publish(&self, author: u32, title: &str, time: f32) -> Level {
            let level = self
                .engine
                .levels()
                .publish(
                    None,
                    sample_content(title),
                    replay_with_level(-1, time),
                    UserId(author),
                    false,
                )
                .unwrap();
            self.wait_cooldown();
            level
        }

        /// Overwrite an existing level by title with fresh content.
        pub fn overwrite(&self, author: u32, title: &str, time: f32) -> Level {
            let level = self
                .engine
                .levels()
                .publish(
                    None,
                    sample_content(title),
                    replay_with_level(-1, time),
                    UserId(author),
                    true,
                )
                .unwrap();
            self.wait_cooldown();
            level
        }

        pub fn wait_cooldown(&self) {
            let secs = self.engine.config().publish.cooldown_secs as i64;
            self.clock.advance(TimeDelta::seconds(secs));
        }

        /// Submit against whatever version the level is at.
        pub fn submit(&self, user: u32, level: LevelId, time: f32) -> ScoreEntry {
            self.engine
                .ledger()
                .submit_current(replay_for(level, time), UserId(user), Some(level))
                .unwrap()
                .entry
        }

        pub fn ranked_users(&self, level: LevelId, requester: Option<u32>) -> Vec<u32> {
            let mut query = RankQuery::new(level);
            if let Some(user) = requester {
                query = query.requester(UserId(user));
            }
            self.engine
                .leaderboard()
                .rank(&query)
                .unwrap()
                .entries
                .iter()
                .map(|entry| entry.user_id.get())
                .collect()
        }
    }
}
