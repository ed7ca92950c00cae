/// Page size assumed when a descriptor has no `TP:` line.
pub const DEFAULT_PAGE_SIZE: u32 = 4096;

/// Size in bytes of one matrix element in generated traces.
pub const ELEMENT_SIZE: u32 = 4;
/// Matrices touched by each generated process (two operands plus the result).
pub const MATRICES_PER_PROCESS: u32 = 3;

/// Largest frame pool a run may request.
pub const MAX_FRAMES: usize = 1 << 20;

/// Cycles between progress lines.
pub const PROGRESS_INTERVAL: u64 = 1000;

pub const ADDRESS_SECTION: &str = "Direcciones:";
pub const PAGE_SIZE_KEY: &str = "TP:";
pub const ROWS_KEY: &str = "NF:";
pub const COLS_KEY: &str = "NC:";
pub const REFERENCES_KEY: &str = "NR:";
pub const PAGES_KEY: &str = "NP:";

/// File name of the descriptor for process `pid`.
pub fn process_file_name(pid: usize) -> String {
    format!("proc{}.txt", pid)
}
