use crate::error::{Result, SimError};
use crate::page_table::PageTable;

/// Ordered virtual addresses of one process with a read cursor
#[derive(Debug, Clone, Default)]
pub struct AddressTrace {
    addresses: Vec<u32>,
    cursor: usize,
}

impl AddressTrace {
    pub fn new(addresses: Vec<u32>) -> Self {
        AddressTrace { addresses, cursor: 0 }
    }

    #[inline]
    pub fn has_next(&self) -> bool {
        self.cursor < self.addresses.len()
    }

    /// Consume the next address, or `None` once the trace is exhausted
    pub fn next_address(&mut self) -> Option<u32> {
        let address = self.addresses.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(address)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.addresses.len() - self.cursor
    }

    pub fn addresses(&self) -> &[u32] {
        &self.addresses
    }
}

/// A simulated process: its trace, page table and fault counters
///
/// `record_fault` and `record_swap_access` are the only ways to change the
/// counters. The reference count is fixed by the trace at construction.
#[derive(Debug)]
pub struct Process {
    pid: usize,
    page_size: u32,
    rows: u32,
    cols: u32,
    trace: AddressTrace,
    page_table: PageTable,
    page_faults: u64,
    swap_accesses: u64,
}

impl Process {
    /// `page_size` must be non-zero; descriptor parsing rejects zero sizes.
    pub fn new(pid: usize, page_size: u32, rows: u32, cols: u32, addresses: Vec<u32>) -> Self {
        debug_assert!(page_size > 0, "page size must be non-zero");
        Process {
            pid,
            page_size,
            rows,
            cols,
            trace: AddressTrace::new(addresses),
            page_table: PageTable::new(),
            page_faults: 0,
            swap_accesses: 0,
        }
    }

    pub fn pid(&self) -> usize {
        self.pid
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Matrix dimensions (rows, cols), for reporting
    pub fn dimensions(&self) -> (u32, u32) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn has_next(&self) -> bool {
        self.trace.has_next()
    }

    pub fn next_address(&mut self) -> Result<u32> {
        self.trace
            .next_address()
            .ok_or(SimError::ExhaustedTrace { pid: self.pid })
    }

    pub fn trace(&self) -> &AddressTrace {
        &self.trace
    }

    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    pub(crate) fn page_table_mut(&mut self) -> &mut PageTable {
        &mut self.page_table
    }

    pub fn record_fault(&mut self) {
        self.page_faults += 1;
    }

    pub fn record_swap_access(&mut self, count: u64) {
        self.swap_accesses += count;
    }

    /// Unmap `page` after its frame was taken; a dirty page costs one swap access
    pub fn notify_page_removed(&mut self, page: u32) {
        if self.page_table.evict(page) {
            self.record_swap_access(1);
        }
    }

    pub fn mark_page_modified(&mut self, page: u32) {
        self.page_table.mark_modified(page);
    }

    pub fn page_faults(&self) -> u64 {
        self.page_faults
    }

    pub fn swap_accesses(&self) -> u64 {
        self.swap_accesses
    }

    pub fn total_references(&self) -> usize {
        self.trace.len()
    }

    /// Hits so far: references consumed minus faults
    pub fn hits(&self) -> u64 {
        self.trace.position() as u64 - self.page_faults
    }

    /// Faults over total references; 0.0 for an empty trace
    pub fn page_fault_rate(&self) -> f64 {
        match self.total_references() {
            0 => 0.0,
            total => self.page_faults as f64 / total as f64,
        }
    }

    pub fn hit_rate(&self) -> f64 {
        1.0 - self.page_fault_rate()
    }
}
