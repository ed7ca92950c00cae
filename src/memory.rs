use std::collections::{BTreeMap, HashMap};

use log::{debug, trace};

use crate::error::{Result, SimError};
use crate::lru::RecencyTracker;

/// A page pushed out of its frame to make room for another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eviction {
    pub pid: usize,
    pub page: u32,
}

/// Outcome of a successful frame allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub frame: usize,
    pub evicted: Option<Eviction>,
}

/// Global pool of physical frames, partitioned across processes
///
/// Every frame is either free or held by exactly one process. Replacement is
/// local: when the pool is exhausted, a faulting process can only reuse one of
/// its own frames.
#[derive(Debug)]
pub struct FrameAllocator {
    occupied: Vec<bool>,
    owners: HashMap<usize, usize>,
    resident: HashMap<usize, u32>,
    // Frames per process, in acquisition order
    working_sets: HashMap<usize, Vec<usize>>,
    recency: RecencyTracker,
}

impl FrameAllocator {
    pub fn new(total_frames: usize) -> Self {
        FrameAllocator {
            occupied: vec![false; total_frames],
            owners: HashMap::new(),
            resident: HashMap::new(),
            working_sets: HashMap::new(),
            recency: RecencyTracker::new(),
        }
    }

    pub fn total_frames(&self) -> usize {
        self.occupied.len()
    }

    /// Grant each process `frames_per_process` free frames
    ///
    /// Frames are handed out in process order, lowest index first. Granted
    /// frames are stamped with `now` so they are eligible for replacement
    /// before they hold any page.
    pub fn initialize(&mut self, pids: &[usize], frames_per_process: usize, now: u64) -> Result<()> {
        let needed = pids.len() * frames_per_process;
        if needed > self.free_frame_count() {
            return Err(SimError::Config(format!(
                "{} frames requested but only {} are free",
                needed,
                self.free_frame_count()
            )));
        }

        for &pid in pids {
            self.working_sets.entry(pid).or_default();
            for _ in 0..frames_per_process {
                let Some(frame) = self.find_free_frame() else {
                    break;
                };
                self.grant(pid, frame);
                self.recency.touch(frame, now);
            }
            debug!("Process {} starts with frames {:?}", pid, self.frames_held_by(pid));
        }
        Ok(())
    }

    /// Find a frame for `page` of process `pid`
    ///
    /// Free frames are used first, growing the process beyond its initial
    /// share. Otherwise the least recently used frame among the process's
    /// own frames is reassigned.
    pub fn allocate(&mut self, pid: usize, page: u32, now: u64) -> Result<Allocation> {
        if let Some(frame) = self.find_free_frame() {
            self.grant(pid, frame);
            self.resident.insert(frame, page);
            self.recency.touch(frame, now);
            trace!("Process {} page {} -> free frame {}", pid, page, frame);
            return Ok(Allocation { frame, evicted: None });
        }

        self.replace(pid, page, now)
    }

    fn replace(&mut self, pid: usize, page: u32, now: u64) -> Result<Allocation> {
        let candidates = self
            .working_sets
            .get(&pid)
            .filter(|frames| !frames.is_empty())
            .ok_or(SimError::NoFrameAvailable { pid })?;

        let victim = self
            .recency
            .select_victim(candidates)
            .map_err(|_| SimError::NoFrameAvailable { pid })?;

        let previous_owner = self.owners.get(&victim).copied().unwrap_or(pid);
        let evicted = self
            .resident
            .insert(victim, page)
            .map(|old_page| Eviction { pid: previous_owner, page: old_page });

        // The reused frame moves to the back of the acquisition order
        if let Some(frames) = self.working_sets.get_mut(&pid) {
            frames.retain(|&f| f != victim);
            frames.push(victim);
        }
        self.owners.insert(victim, pid);
        self.recency.touch(victim, now);

        match evicted {
            Some(ev) => debug!(
                "Process {} page {} replaces page {} in frame {}",
                pid, page, ev.page, victim
            ),
            None => trace!("Process {} page {} -> reserved frame {}", pid, page, victim),
        }

        Ok(Allocation { frame: victim, evicted })
    }

    /// Return every frame held by `pid` to the pool
    ///
    /// Returns the number of frames released.
    pub fn release(&mut self, pid: usize) -> usize {
        let Some(frames) = self.working_sets.remove(&pid) else {
            return 0;
        };
        for &frame in &frames {
            self.occupied[frame] = false;
            self.owners.remove(&frame);
            self.resident.remove(&frame);
            self.recency.forget(frame);
        }
        debug!("Process {} released {} frames", pid, frames.len());
        frames.len()
    }

    /// Refresh the recency of a frame on a hit
    pub fn touch(&mut self, frame: usize, now: u64) {
        self.recency.touch(frame, now);
    }

    pub fn free_frame_count(&self) -> usize {
        self.occupied.iter().filter(|&&used| !used).count()
    }

    pub fn frames_held_by(&self, pid: usize) -> &[usize] {
        self.working_sets.get(&pid).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn owner_of(&self, frame: usize) -> Option<usize> {
        self.owners.get(&frame).copied()
    }

    pub fn resident_page(&self, frame: usize) -> Option<u32> {
        self.resident.get(&frame).copied()
    }

    pub fn recency(&self) -> &RecencyTracker {
        &self.recency
    }

    /// Frames held per process, for processes holding at least one
    pub fn usage_snapshot(&self) -> BTreeMap<usize, usize> {
        self.occupied
            .iter()
            .enumerate()
            .filter(|(_, used)| **used)
            .filter_map(|(frame, _)| self.owner_of(frame))
            .fold(BTreeMap::new(), |mut usage, pid| {
                *usage.entry(pid).or_insert(0) += 1;
                usage
            })
    }

    fn find_free_frame(&self) -> Option<usize> {
        self.occupied.iter().position(|&used| !used)
    }

    fn grant(&mut self, pid: usize, frame: usize) {
        self.occupied[frame] = true;
        self.owners.insert(frame, pid);
        self.working_sets.entry(pid).or_default().push(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held_total(alloc: &FrameAllocator, pids: &[usize]) -> usize {
        pids.iter().map(|&pid| alloc.frames_held_by(pid).len()).sum()
    }

    #[test]
    fn test_initialize_even_split() {
        let mut alloc = FrameAllocator::new(6);
        alloc.initialize(&[0, 1, 2], 2, 0).unwrap();

        assert_eq!(alloc.frames_held_by(0), &[0, 1]);
        assert_eq!(alloc.frames_held_by(1), &[2, 3]);
        assert_eq!(alloc.frames_held_by(2), &[4, 5]);
        assert_eq!(alloc.free_frame_count(), 0);
        assert_eq!(alloc.owner_of(3), Some(1));
        assert_eq!(alloc.recency().last_access(5), Some(0));
    }

    #[test]
    fn test_initialize_rejects_oversubscription() {
        let mut alloc = FrameAllocator::new(4);
        assert!(matches!(
            alloc.initialize(&[0, 1, 2], 2, 0),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn test_allocate_prefers_free_frame() {
        let mut alloc = FrameAllocator::new(4);
        alloc.initialize(&[0], 2, 0).unwrap();

        let allocation = alloc.allocate(0, 9, 1).unwrap();
        assert_eq!(allocation, Allocation { frame: 2, evicted: None });
        assert_eq!(alloc.frames_held_by(0), &[0, 1, 2]);
        assert_eq!(alloc.resident_page(2), Some(9));
        assert_eq!(alloc.free_frame_count(), 1);
    }

    #[test]
    fn test_replacement_uses_reserved_frames_then_lru() {
        let mut alloc = FrameAllocator::new(4);
        alloc.initialize(&[0, 1], 2, 0).unwrap();

        let a = alloc.allocate(0, 0, 1).unwrap();
        assert_eq!(a, Allocation { frame: 0, evicted: None });
        let b = alloc.allocate(0, 1, 2).unwrap();
        assert_eq!(b, Allocation { frame: 1, evicted: None });

        let c = alloc.allocate(0, 2, 3).unwrap();
        assert_eq!(c.frame, 0);
        assert_eq!(c.evicted, Some(Eviction { pid: 0, page: 0 }));
        assert_eq!(alloc.frames_held_by(0), &[1, 0]);
        assert_eq!(alloc.resident_page(0), Some(2));
    }

    #[test]
    fn test_replacement_is_local() {
        let mut alloc = FrameAllocator::new(4);
        alloc.initialize(&[0, 1], 2, 0).unwrap();
        alloc.allocate(1, 0, 1).unwrap();
        alloc.allocate(1, 1, 2).unwrap();

        // Process 0's idle frames are older, but process 1 may only evict its own
        let allocation = alloc.allocate(1, 2, 12).unwrap();
        assert_eq!(allocation.frame, 2);
        assert_eq!(allocation.evicted, Some(Eviction { pid: 1, page: 0 }));
        assert_eq!(alloc.frames_held_by(0), &[0, 1]);
        assert_eq!(alloc.owner_of(0), Some(0));
    }

    #[test]
    fn test_hit_refresh_changes_victim() {
        let mut alloc = FrameAllocator::new(2);
        alloc.initialize(&[0], 2, 0).unwrap();
        alloc.allocate(0, 0, 1).unwrap();
        alloc.allocate(0, 1, 2).unwrap();
        alloc.touch(0, 3);

        let allocation = alloc.allocate(0, 2, 4).unwrap();
        assert_eq!(allocation.frame, 1);
        assert_eq!(allocation.evicted, Some(Eviction { pid: 0, page: 1 }));
    }

    #[test]
    fn test_no_frame_available() {
        let mut alloc = FrameAllocator::new(2);
        alloc.initialize(&[0], 2, 0).unwrap();

        assert!(matches!(
            alloc.allocate(7, 0, 1),
            Err(SimError::NoFrameAvailable { pid: 7 })
        ));
    }

    #[test]
    fn test_release_returns_frames() {
        let mut alloc = FrameAllocator::new(4);
        alloc.initialize(&[0, 1], 2, 0).unwrap();
        alloc.allocate(0, 0, 1).unwrap();

        assert_eq!(alloc.release(0), 2);
        assert_eq!(alloc.free_frame_count(), 2);
        assert!(alloc.frames_held_by(0).is_empty());
        assert_eq!(alloc.owner_of(0), None);
        assert_eq!(alloc.resident_page(0), None);
        assert_eq!(alloc.recency().last_access(0), None);
        assert_eq!(alloc.release(0), 0);

        // Process 1 grows into the released frames
        let allocation = alloc.allocate(1, 5, 2).unwrap();
        assert_eq!(allocation.frame, 0);
        assert_eq!(alloc.frames_held_by(1), &[2, 3, 0]);
    }

    #[test]
    fn test_conservation_and_snapshot() {
        let mut alloc = FrameAllocator::new(6);
        let pids = [0, 1, 2];
        alloc.initialize(&pids, 2, 0).unwrap();
        assert_eq!(held_total(&alloc, &pids) + alloc.free_frame_count(), 6);

        alloc.release(1);
        alloc.allocate(2, 0, 1).unwrap();
        assert_eq!(held_total(&alloc, &pids) + alloc.free_frame_count(), 6);

        let usage = alloc.usage_snapshot();
        assert_eq!(usage.get(&0), Some(&2));
        assert_eq!(usage.get(&1), None);
        assert_eq!(usage.get(&2), Some(&3));
    }
}
