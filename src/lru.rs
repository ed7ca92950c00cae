use std::collections::HashMap;

use crate::error::{Result, SimError};

/// Last-touch timestamps of physical frames
#[derive(Debug, Default)]
pub struct RecencyTracker {
    stamps: HashMap<usize, u64>,
}

impl RecencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch(&mut self, frame: usize, timestamp: u64) {
        self.stamps.insert(frame, timestamp);
    }

    pub fn forget(&mut self, frame: usize) {
        self.stamps.remove(&frame);
    }

    pub fn last_access(&self, frame: usize) -> Option<u64> {
        self.stamps.get(&frame).copied()
    }

    /// Least recently used frame among `candidates`
    ///
    /// Frames without a timestamp are skipped. On equal timestamps the
    /// earliest candidate in the slice wins.
    pub fn select_victim(&self, candidates: &[usize]) -> Result<usize> {
        let mut victim: Option<(usize, u64)> = None;
        for &frame in candidates {
            let Some(stamp) = self.last_access(frame) else {
                continue;
            };
            match victim {
                Some((_, oldest)) if stamp >= oldest => {}
                _ => victim = Some((frame, stamp)),
            }
        }
        victim.map(|(frame, _)| frame).ok_or(SimError::NoVictim)
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selects_oldest() {
        let mut lru = RecencyTracker::new();
        lru.touch(0, 30);
        lru.touch(1, 10);
        lru.touch(2, 20);

        assert_eq!(lru.select_victim(&[0, 1, 2]).unwrap(), 1);
        assert_eq!(lru.select_victim(&[0, 2]).unwrap(), 2);
    }

    #[test]
    fn test_tie_goes_to_first_candidate() {
        let mut lru = RecencyTracker::new();
        lru.touch(5, 7);
        lru.touch(3, 7);
        lru.touch(9, 7);

        assert_eq!(lru.select_victim(&[5, 3, 9]).unwrap(), 5);
        assert_eq!(lru.select_victim(&[9, 3, 5]).unwrap(), 9);
    }

    #[test]
    fn test_untracked_candidates_are_skipped() {
        let mut lru = RecencyTracker::new();
        lru.touch(2, 100);

        assert_eq!(lru.select_victim(&[0, 1, 2]).unwrap(), 2);
        assert!(matches!(lru.select_victim(&[0, 1]), Err(SimError::NoVictim)));
    }

    #[test]
    fn test_empty_candidates() {
        let lru = RecencyTracker::new();
        assert!(matches!(lru.select_victim(&[]), Err(SimError::NoVictim)));
    }

    #[test]
    fn test_touch_and_forget() {
        let mut lru = RecencyTracker::new();
        lru.touch(4, 1);
        lru.touch(4, 8);
        assert_eq!(lru.last_access(4), Some(8));
        assert_eq!(lru.len(), 1);

        lru.forget(4);
        assert_eq!(lru.last_access(4), None);
        assert!(lru.is_empty());
    }
}
