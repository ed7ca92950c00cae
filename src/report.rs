use std::fmt;

use crate::locality::analyze_all;
use crate::simulation::Simulation;

const RULE_WIDE: usize = 60;
const RULE_NARROW: usize = 40;

/// Final console report of a simulation run
pub struct StatisticsReport<'a> {
    simulation: &'a Simulation,
}

impl<'a> StatisticsReport<'a> {
    pub fn new(simulation: &'a Simulation) -> Self {
        StatisticsReport { simulation }
    }

    fn write_processes(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(RULE_WIDE))?;
        writeln!(f, "FINAL SIMULATION STATISTICS")?;
        writeln!(f, "{}", "=".repeat(RULE_WIDE))?;

        for process in self.simulation.processes() {
            let (rows, cols) = process.dimensions();
            writeln!(f)?;
            writeln!(f, "Process {}:", process.pid())?;
            writeln!(f, "  Matrix size: {}x{}", rows, cols)?;
            writeln!(f, "  Total references: {}", process.total_references())?;
            writeln!(f, "  Page faults: {}", process.page_faults())?;
            writeln!(f, "  Swap accesses: {}", process.swap_accesses())?;
            writeln!(f, "  Fault rate: {:.2}%", process.page_fault_rate() * 100.0)?;
            writeln!(f, "  Hit rate: {:.2}%", process.hit_rate() * 100.0)?;
        }
        Ok(())
    }

    fn write_locality(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        section(f, "LOCALITY ANALYSIS")?;

        let report = analyze_all(self.simulation.processes());
        for pid in &report.skipped {
            writeln!(f, "Process {}: no addresses to analyze", pid)?;
        }
        for stats in &report.per_process {
            writeln!(f, "Process {}:", stats.pid)?;
            writeln!(
                f,
                "  Accesses: {}, Same-page hits: {}, Page changes: {}",
                stats.accesses, stats.same_page_hits, stats.page_changes
            )?;
            writeln!(f, "  Locality: {:.2}% - {}", stats.ratio * 100.0, stats.level)?;
        }

        if let (Some(ratio), Some(level)) = (report.global_ratio, report.global_level()) {
            writeln!(f)?;
            writeln!(f, "GLOBAL LOCALITY: {:.2}% - {}", ratio * 100.0, level)?;
        }
        Ok(())
    }

    fn write_frame_usage(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        section(f, "FRAME USAGE")?;

        let usage = self.simulation.allocator().usage_snapshot();
        if usage.is_empty() {
            writeln!(f, "All {} frames are free", self.simulation.allocator().total_frames())?;
        }
        for (pid, frames) in usage {
            writeln!(f, "Process {}: {} frames", pid, frames)?;
        }
        Ok(())
    }
}

fn section(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{}", "=".repeat(RULE_NARROW))?;
    writeln!(f, "{}", title)?;
    writeln!(f, "{}", "=".repeat(RULE_NARROW))
}

impl fmt::Display for StatisticsReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_processes(f)?;
        self.write_locality(f)?;
        self.write_frame_usage(f)
    }
}
