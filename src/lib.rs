pub mod constants;
pub mod error;
pub mod generator;
pub mod io;
pub mod locality;
pub mod lru;
pub mod memory;
pub mod page_table;
pub mod process;
pub mod report;
pub mod simulation;
pub mod translation;

// Re-export commonly used items for convenience
pub use error::{Result, SimError};
pub use memory::FrameAllocator;
pub use process::Process;
pub use report::StatisticsReport;
pub use simulation::{Simulation, SimulationConfig, SimulationSummary};
