use std::fmt;

use crate::process::Process;

/// Five-way classification of a same-page ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalityLevel {
    High,
    MediumHigh,
    Medium,
    Low,
    VeryLow,
}

impl LocalityLevel {
    /// Each bucket includes its lower bound
    pub fn classify(ratio: f64) -> Self {
        if ratio >= 0.8 {
            LocalityLevel::High
        } else if ratio >= 0.6 {
            LocalityLevel::MediumHigh
        } else if ratio >= 0.4 {
            LocalityLevel::Medium
        } else if ratio >= 0.2 {
            LocalityLevel::Low
        } else {
            LocalityLevel::VeryLow
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            LocalityLevel::High => "HIGH (cache friendly)",
            LocalityLevel::MediumHigh => "MEDIUM-HIGH (good behavior)",
            LocalityLevel::Medium => "MEDIUM (regular behavior)",
            LocalityLevel::Low => "LOW (frequent page jumps)",
            LocalityLevel::VeryLow => "VERY LOW (random pattern)",
        }
    }
}

impl fmt::Display for LocalityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalityStats {
    pub pid: usize,
    pub accesses: usize,
    /// Accesses on the same page as the one before
    pub same_page_hits: usize,
    pub page_changes: usize,
    pub ratio: f64,
    pub level: LocalityLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalityReport {
    pub per_process: Vec<LocalityStats>,
    /// Pids with an empty trace
    pub skipped: Vec<usize>,
    /// Total hits over total accesses, if there were any accesses
    pub global_ratio: Option<f64>,
}

impl LocalityReport {
    pub fn global_level(&self) -> Option<LocalityLevel> {
        self.global_ratio.map(LocalityLevel::classify)
    }
}

/// Page-switch statistics over a process's full trace
///
/// The first access always counts as a page change. Returns `None` for an
/// empty trace.
pub fn analyze(process: &Process) -> Option<LocalityStats> {
    let addresses = process.trace().addresses();
    if addresses.is_empty() {
        return None;
    }

    let page_size = process.page_size();
    let mut current: Option<u32> = None;
    let mut same_page_hits = 0;
    let mut page_changes = 0;

    for &address in addresses {
        let page = address / page_size;
        if current == Some(page) {
            same_page_hits += 1;
        } else {
            page_changes += 1;
            current = Some(page);
        }
    }

    let ratio = same_page_hits as f64 / addresses.len() as f64;
    Some(LocalityStats {
        pid: process.pid(),
        accesses: addresses.len(),
        same_page_hits,
        page_changes,
        ratio,
        level: LocalityLevel::classify(ratio),
    })
}

pub fn analyze_all(processes: &[Process]) -> LocalityReport {
    let mut per_process = Vec::new();
    let mut skipped = Vec::new();

    for process in processes {
        match analyze(process) {
            Some(stats) => per_process.push(stats),
            None => skipped.push(process.pid()),
        }
    }

    let hits: usize = per_process.iter().map(|s| s.same_page_hits).sum();
    let accesses: usize = per_process.iter().map(|s| s.accesses).sum();
    let global_ratio = (accesses > 0).then(|| hits as f64 / accesses as f64);

    LocalityReport {
        per_process,
        skipped,
        global_ratio,
    }
}
