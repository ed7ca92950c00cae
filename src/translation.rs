use crate::page_table::PageTable;

/// A virtual address split into page number and offset for a given page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualAddress {
    pub va: u32,
    pub page: u32,
    pub offset: u32,
}

impl VirtualAddress {
    /// Decompose a raw VA; `page_size` need not be a power of two
    pub fn from_raw(va: u32, page_size: u32) -> Self {
        VirtualAddress {
            va,
            page: va / page_size,
            offset: va % page_size,
        }
    }
}

impl std::fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VA({}) = (p={}, d={})", self.va, self.page, self.offset)
    }
}

/// Result of looking an address up in a page table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationResult {
    Resident(usize),
    NotPresent,
}

/// Translate `va` through `table` without side effects
pub fn translate(va: &VirtualAddress, table: &PageTable) -> TranslationResult {
    match table.frame_of(va.page) {
        Some(frame) => TranslationResult::Resident(frame),
        None => TranslationResult::NotPresent,
    }
}

/// Physical byte address of `offset` within `frame`
#[inline]
pub fn physical_address(frame: usize, offset: u32, page_size: u32) -> u64 {
    frame as u64 * page_size as u64 + offset as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decomposition_power_of_two() {
        let va = VirtualAddress::from_raw(8196, 4096);
        assert_eq!(va.page, 2);
        assert_eq!(va.offset, 4);
    }

    #[test]
    fn test_decomposition_odd_page_size() {
        let va = VirtualAddress::from_raw(1000, 300);
        assert_eq!(va.page, 3);
        assert_eq!(va.offset, 100);
        assert_eq!(va.page * 300 + va.offset, 1000);
    }

    #[test]
    fn test_page_boundaries() {
        assert_eq!(VirtualAddress::from_raw(4095, 4096).page, 0);
        assert_eq!(VirtualAddress::from_raw(4096, 4096).page, 1);
        assert_eq!(VirtualAddress::from_raw(0, 4096), VirtualAddress { va: 0, page: 0, offset: 0 });
    }

    #[test]
    fn test_display() {
        let display = format!("{}", VirtualAddress::from_raw(4100, 4096));
        assert!(display.contains("4100"));
        assert!(display.contains("p=1"));
        assert!(display.contains("d=4"));
    }

    #[test]
    fn test_translate() {
        let mut table = PageTable::new();
        table.install(1, 7, 1);

        let hit = translate(&VirtualAddress::from_raw(4100, 4096), &table);
        assert_eq!(hit, TranslationResult::Resident(7));

        let miss = translate(&VirtualAddress::from_raw(0, 4096), &table);
        assert_eq!(miss, TranslationResult::NotPresent);
        assert!(table.lookup(0).frame.is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_physical_address() {
        assert_eq!(physical_address(0, 10, 4096), 10);
        assert_eq!(physical_address(3, 5, 4096), 3 * 4096 + 5);
    }
}
