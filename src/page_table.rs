use std::collections::HashMap;

/// State of one virtual page of a process
///
/// A page is resident exactly when `frame` is set; there is no separate
/// present flag that could drift out of sync with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTableEntry {
    pub virtual_page: u32,
    pub frame: Option<usize>,
    pub modified: bool,
    pub referenced: bool,
    pub last_access: u64,
}

impl PageTableEntry {
    /// A not-present entry, as seen for a page that was never installed
    pub fn not_present(virtual_page: u32) -> Self {
        PageTableEntry {
            virtual_page,
            frame: None,
            modified: false,
            referenced: false,
            last_access: 0,
        }
    }

    #[inline]
    pub fn is_present(&self) -> bool {
        self.frame.is_some()
    }
}

/// Sparse per-process page table
///
/// Entries are only materialized by `install` and `mark_modified`. Lookups of
/// unseen pages return a not-present view without touching the table. Once
/// created, an entry stays for the life of the process, even after eviction.
#[derive(Debug, Default)]
pub struct PageTable {
    entries: HashMap<u32, PageTableEntry>,
}

impl PageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `page`, or a not-present view if the page was never tracked
    pub fn lookup(&self, page: u32) -> PageTableEntry {
        self.entries
            .get(&page)
            .copied()
            .unwrap_or_else(|| PageTableEntry::not_present(page))
    }

    #[inline]
    pub fn is_present(&self, page: u32) -> bool {
        self.frame_of(page).is_some()
    }

    /// Frame holding `page`, if resident
    #[inline]
    pub fn frame_of(&self, page: u32) -> Option<usize> {
        self.entries.get(&page).and_then(|entry| entry.frame)
    }

    /// Map `page` to `frame` and refresh its access time
    pub fn install(&mut self, page: u32, frame: usize, now: u64) {
        let entry = self
            .entries
            .entry(page)
            .or_insert_with(|| PageTableEntry::not_present(page));
        entry.frame = Some(frame);
        entry.referenced = true;
        entry.last_access = now;
    }

    /// Record a hit on a resident page
    pub fn touch(&mut self, page: u32, now: u64) {
        if let Some(entry) = self.entries.get_mut(&page) {
            entry.referenced = true;
            entry.last_access = now;
        }
    }

    pub fn mark_modified(&mut self, page: u32) {
        self.entries
            .entry(page)
            .or_insert_with(|| PageTableEntry::not_present(page))
            .modified = true;
    }

    /// Unmap `page`
    ///
    /// Returns `true` if the page was resident and dirty, i.e. the eviction
    /// costs a write-back. Evicting a page that is not resident is a no-op.
    pub fn evict(&mut self, page: u32) -> bool {
        match self.entries.get_mut(&page) {
            Some(entry) if entry.is_present() => {
                let dirty = entry.modified;
                entry.frame = None;
                entry.modified = false;
                dirty
            }
            _ => false,
        }
    }

    /// Page currently resident in `frame`
    ///
    /// Linear scan over all entries; diagnostics only.
    pub fn reverse_lookup(&self, frame: usize) -> Option<u32> {
        self.entries
            .values()
            .find(|entry| entry.frame == Some(frame))
            .map(|entry| entry.virtual_page)
    }

    /// Number of pages ever tracked
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resident_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.is_present()).count()
    }
}
