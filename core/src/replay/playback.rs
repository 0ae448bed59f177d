//! Replay playback
//!
//! Steps a decoded replay in lockstep with a 100Hz simulation. This is the
//! frame stream handed to ghost rendering and the realtime lobby.

use std::time::Duration;

use crate::replay::types::{FRAME_DURATION, InputFrame, ReplayHeader, ReplayRecord};

/// Playback state over a borrowed replay
pub struct Playback<'a> {
    record: &'a ReplayRecord,
    current_frame: usize,
    looping: bool,
}

impl<'a> Playback<'a> {
    pub fn new(record: &'a ReplayRecord) -> Self {
        Self {
            record,
            current_frame: 0,
            looping: false,
        }
    }

    /// Restart from the first frame when the end is reached
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn header(&self) -> &ReplayHeader {
        self.record.header()
    }

    pub fn is_complete(&self) -> bool {
        self.current_frame >= self.record.frame_count()
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn frame_count(&self) -> usize {
        self.record.frame_count()
    }

    /// Get playback progress (0.0 to 1.0)
    pub fn progress(&self) -> f32 {
        if self.record.frame_count() == 0 {
            return 0.0;
        }
        self.current_frame as f32 / self.record.frame_count() as f32
    }

    /// Simulated time played so far
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(FRAME_DURATION.as_millis() as u64 * self.current_frame as u64)
    }

    /// Inputs for the current frame
    pub fn current(&self) -> Option<InputFrame> {
        self.record.frame(self.current_frame)
    }

    /// Inputs held at simulated time `at`
    pub fn frame_at(&self, at: Duration) -> Option<InputFrame> {
        let step = at.as_millis() / FRAME_DURATION.as_millis();
        usize::try_from(step).ok().and_then(|s| self.record.frame(s))
    }

    /// Advance to the next frame
    pub fn advance(&mut self) -> bool {
        if self.is_complete() {
            if self.looping && self.record.frame_count() > 0 {
                self.current_frame = 0;
                true
            } else {
                false
            }
        } else {
            self.current_frame += 1;
            true
        }
    }

    /// Seek to a specific frame
    pub fn seek(&mut self, frame: usize) -> SeekResult {
        if frame >= self.record.frame_count() {
            return SeekResult::OutOfRange;
        }
        let result = if frame < self.current_frame {
            SeekResult::Rewound
        } else {
            SeekResult::Forward
        };
        self.current_frame = frame;
        result
    }
}

/// Result of a seek operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekResult {
    /// Moved forward; simulation can fast-forward from the current state
    Forward,
    /// Moved backward; simulation must restart from the beginning
    Rewound,
    /// Target frame is out of range
    OutOfRange,
}

impl Iterator for Playback<'_> {
    type Item = InputFrame;

    fn next(&mut self) -> Option<InputFrame> {
        let frame = self.current()?;
        self.current_frame += 1;
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::binary::{decode, encode};

    fn create_test_replay(frames: usize) -> ReplayRecord {
        let inputs: Vec<InputFrame> = (0..frames)
            .map(|i| InputFrame::from_bits_truncate(i as u8))
            .collect();
        let header = ReplayHeader {
            elapsed_time: frames as f32 / 100.0,
            ..ReplayHeader::default()
        };
        decode(&encode(&header, &inputs).unwrap()).unwrap()
    }

    #[test]
    fn test_playback_basic() {
        let replay = create_test_replay(8);
        let mut playback = Playback::new(&replay);

        assert_eq!(playback.current_frame(), 0);
        assert_eq!(playback.frame_count(), 8);

        for _ in 0..8 {
            assert!(playback.advance());
        }

        assert!(playback.is_complete());
        assert!(!playback.advance());
        assert_eq!(playback.elapsed(), Duration::from_millis(80));
    }

    #[test]
    fn test_frame_at_time() {
        let replay = create_test_replay(12);
        let playback = Playback::new(&replay);

        assert_eq!(playback.frame_at(Duration::ZERO), replay.frame(0));
        assert_eq!(playback.frame_at(Duration::from_millis(9)), replay.frame(0));
        assert_eq!(playback.frame_at(Duration::from_millis(10)), replay.frame(1));
        assert_eq!(playback.frame_at(Duration::from_millis(115)), replay.frame(11));
        assert_eq!(playback.frame_at(Duration::from_millis(120)), None);
    }

    #[test]
    fn test_playback_seek() {
        let replay = create_test_replay(100);
        let mut playback = Playback::new(&replay);

        assert_eq!(playback.seek(50), SeekResult::Forward);
        assert_eq!(playback.current_frame(), 50);
        assert_eq!(playback.seek(25), SeekResult::Rewound);
        assert_eq!(playback.seek(200), SeekResult::OutOfRange);
        assert_eq!(playback.current_frame(), 25);
    }

    #[test]
    fn test_playback_loop() {
        let replay = create_test_replay(4);
        let mut playback = Playback::new(&replay).looping(true);

        for _ in 0..5 {
            playback.advance();
        }

        assert!(!playback.is_complete());
        assert_eq!(playback.current_frame(), 0);
    }

    #[test]
    fn test_iterates_every_frame_in_order() {
        let replay = create_test_replay(10);
        let collected: Vec<InputFrame> = Playback::new(&replay).collect();
        assert_eq!(collected, replay.frames());
    }
}
