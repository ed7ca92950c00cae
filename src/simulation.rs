use std::collections::VecDeque;
use std::path::Path;

use log::{debug, error, info, trace};

use crate::constants::{MAX_FRAMES, PROGRESS_INTERVAL};
use crate::error::{Result, SimError};
use crate::io::load_processes;
use crate::memory::{Eviction, FrameAllocator};
use crate::process::Process;
use crate::translation::{physical_address, translate, TranslationResult, VirtualAddress};

/// Process count and frame pool size for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationConfig {
    pub processes: usize,
    pub total_frames: usize,
}

impl SimulationConfig {
    /// Frames must split evenly across processes
    pub fn new(processes: usize, total_frames: usize) -> Result<Self> {
        if processes == 0 {
            return Err(SimError::Config("at least one process is required".to_string()));
        }
        if total_frames > MAX_FRAMES {
            return Err(SimError::Config(format!(
                "{} frames requested, at most {} are supported",
                total_frames, MAX_FRAMES
            )));
        }
        if total_frames % processes != 0 {
            return Err(SimError::FrameCountNotMultiple {
                processes,
                frames: total_frames,
            });
        }
        Ok(SimulationConfig {
            processes,
            total_frames,
        })
    }

    pub fn frames_per_process(&self) -> usize {
        self.total_frames / self.processes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Active,
    Completed,
    /// Stopped because no frame could be found for a fault
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    Hit { frame: usize },
    Fault { frame: usize, evicted: Option<Eviction> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationSummary {
    pub cycles: u64,
    pub completed: Vec<usize>,
    pub aborted: Vec<usize>,
}

/// Round-robin execution of all loaded processes over a shared frame pool
///
/// Each turn takes the process at the head of the rotation, feeds one of its
/// addresses through its page table and the allocator, and requeues it at
/// the tail while it has addresses left. A process whose trace is exhausted
/// releases its frames and leaves the rotation.
#[derive(Debug)]
pub struct Simulation {
    processes: Vec<Process>,
    states: Vec<ProcessState>,
    allocator: FrameAllocator,
    rotation: VecDeque<usize>,
    clock: u64,
    cycles: u64,
    summary: SimulationSummary,
}

impl Simulation {
    /// Build a run over already loaded processes, granting initial frames
    pub fn new(config: SimulationConfig, processes: Vec<Process>) -> Result<Self> {
        if processes.len() != config.processes {
            return Err(SimError::ProcessCountMismatch {
                expected: config.processes,
                loaded: processes.len(),
            });
        }

        let pids: Vec<usize> = processes.iter().map(Process::pid).collect();
        let mut allocator = FrameAllocator::new(config.total_frames);
        allocator.initialize(&pids, config.frames_per_process(), 0)?;

        Ok(Simulation {
            states: vec![ProcessState::Active; processes.len()],
            rotation: (0..processes.len()).collect(),
            processes,
            allocator,
            clock: 0,
            cycles: 0,
            summary: SimulationSummary::default(),
        })
    }

    /// Load `proc<i>.txt` files from `dir` and build a run
    pub fn load<P: AsRef<Path>>(dir: P, config: SimulationConfig) -> Result<Self> {
        let processes = load_processes(dir, config.processes);
        Self::new(config, processes)
    }

    /// Validate the process and frame counts, then load from `dir`
    ///
    /// No file is opened when the counts are rejected.
    pub fn load_checked<P: AsRef<Path>>(dir: P, processes: usize, total_frames: usize) -> Result<Self> {
        let config = SimulationConfig::new(processes, total_frames)?;
        Self::load(dir, config)
    }

    /// Run every process to completion
    pub fn run(&mut self) -> SimulationSummary {
        info!("Starting simulation...");
        while self.step() {}
        info!("Simulation finished in {} cycles.", self.cycles);
        self.summary()
    }

    /// Execute one turn; returns `false` once the rotation is empty
    pub fn step(&mut self) -> bool {
        let Some(idx) = self.rotation.pop_front() else {
            return false;
        };
        self.cycles += 1;

        if self.processes[idx].has_next() {
            if let Err(e) = self.execute_next(idx) {
                self.abort(idx, &e);
                self.log_progress();
                return true;
            }
        }

        if self.processes[idx].has_next() {
            self.rotation.push_back(idx);
        } else {
            self.complete(idx);
        }

        self.log_progress();
        true
    }

    fn execute_next(&mut self, idx: usize) -> Result<AccessOutcome> {
        let address = self.processes[idx].next_address()?;
        self.access(idx, address)
    }

    /// Resolve one address for the process at `idx`
    ///
    /// Every fault counts one page fault and one swap access, whatever the
    /// state of the page it displaces.
    fn access(&mut self, idx: usize, address: u32) -> Result<AccessOutcome> {
        self.clock += 1;
        let now = self.clock;

        let process = &mut self.processes[idx];
        let pid = process.pid();
        let page_size = process.page_size();
        let va = VirtualAddress::from_raw(address, page_size);

        if let TranslationResult::Resident(frame) = translate(&va, process.page_table()) {
            process.page_table_mut().touch(va.page, now);
            self.allocator.touch(frame, now);
            trace!(
                "Process {} {} hit -> PA {}",
                pid,
                va,
                physical_address(frame, va.offset, page_size)
            );
            return Ok(AccessOutcome::Hit { frame });
        }

        process.record_fault();
        process.record_swap_access(1);

        let allocation = self.allocator.allocate(pid, va.page, now)?;
        if let Some(eviction) = allocation.evicted {
            self.notify_evicted(eviction);
        }
        self.processes[idx]
            .page_table_mut()
            .install(va.page, allocation.frame, now);
        debug!("Process {} {} fault -> frame {}", pid, va, allocation.frame);

        Ok(AccessOutcome::Fault {
            frame: allocation.frame,
            evicted: allocation.evicted,
        })
    }

    fn notify_evicted(&mut self, eviction: Eviction) {
        if let Some(owner) = self.processes.iter_mut().find(|p| p.pid() == eviction.pid) {
            owner.notify_page_removed(eviction.page);
        }
    }

    fn complete(&mut self, idx: usize) {
        let pid = self.processes[idx].pid();
        self.allocator.release(pid);
        self.states[idx] = ProcessState::Completed;
        self.summary.completed.push(pid);
        info!("Process {} completed.", pid);
    }

    fn abort(&mut self, idx: usize, cause: &SimError) {
        let pid = self.processes[idx].pid();
        self.allocator.release(pid);
        self.states[idx] = ProcessState::Aborted;
        self.summary.aborted.push(pid);
        error!("Process {} aborted: {}", pid, cause);
    }

    fn log_progress(&self) {
        if self.cycles % PROGRESS_INTERVAL == 0 {
            info!("Cycle {}, active processes: {}", self.cycles, self.rotation.len());
        }
    }

    /// Mark the page holding `address` as written by process `pid`
    ///
    /// Evicting a written page later costs an extra swap access. Traces carry
    /// no access type, so the scheduler itself never calls this.
    pub fn record_write(&mut self, pid: usize, address: u32) -> Result<()> {
        let process = self
            .processes
            .iter_mut()
            .find(|p| p.pid() == pid)
            .ok_or(SimError::UnknownProcess(pid))?;
        let page = VirtualAddress::from_raw(address, process.page_size()).page;
        process.mark_page_modified(page);
        Ok(())
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub fn process(&self, pid: usize) -> Option<&Process> {
        self.processes.iter().find(|p| p.pid() == pid)
    }

    pub fn state(&self, pid: usize) -> Option<ProcessState> {
        self.processes
            .iter()
            .position(|p| p.pid() == pid)
            .map(|idx| self.states[idx])
    }

    pub fn allocator(&self) -> &FrameAllocator {
        &self.allocator
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn is_finished(&self) -> bool {
        self.rotation.is_empty()
    }

    /// Pids still in the rotation, head first
    pub fn active(&self) -> Vec<usize> {
        self.rotation.iter().map(|&idx| self.processes[idx].pid()).collect()
    }

    pub fn summary(&self) -> SimulationSummary {
        SimulationSummary {
            cycles: self.cycles,
            ..self.summary.clone()
        }
    }
}
