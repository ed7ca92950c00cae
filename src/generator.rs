//! Synthetic traces for a matrix-addition style workload.
//!
//! Each process walks three consecutive `rows x cols` matrices of 4-byte
//! elements, one matrix at a time in row-major order.

use std::path::{Path, PathBuf};

use log::info;

use crate::constants::*;
use crate::error::{Result, SimError};
use crate::io::{process_file_path, GeneratorConfig, ProcessDescriptor};

/// Addresses touched by one process, in access order
///
/// Fails if the three matrices do not fit in a 32-bit address space.
pub fn matrix_trace(rows: u32, cols: u32) -> Result<Vec<u32>> {
    let elements = rows as u64 * cols as u64;
    let span = elements * ELEMENT_SIZE as u64 * MATRICES_PER_PROCESS as u64;
    if span > u32::MAX as u64 + 1 {
        return Err(SimError::Config(format!(
            "{}x{} matrices need {} bytes, more than a 32-bit address space",
            rows, cols, span
        )));
    }

    let matrix_bytes = elements * ELEMENT_SIZE as u64;
    let addresses = (0..MATRICES_PER_PROCESS as u64)
        .flat_map(|matrix| {
            let base = matrix * matrix_bytes;
            (0..elements).map(move |idx| (base + idx * ELEMENT_SIZE as u64) as u32)
        })
        .collect();
    Ok(addresses)
}

pub fn descriptor_for(page_size: u32, side: u32) -> Result<ProcessDescriptor> {
    Ok(ProcessDescriptor {
        page_size,
        rows: side,
        cols: side,
        addresses: matrix_trace(side, side)?,
    })
}

/// Write one descriptor per configured process into `dir`
pub fn generate<P: AsRef<Path>>(config: &GeneratorConfig, dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut written = Vec::with_capacity(config.process_count());

    for (pid, &side) in config.matrix_sides.iter().enumerate() {
        let descriptor = descriptor_for(config.page_size, side)?;
        let path = process_file_path(dir, pid);
        descriptor.write_to(&path)?;
        info!(
            "Wrote {} ({} references, {} pages)",
            path.display(),
            descriptor.addresses.len(),
            descriptor.virtual_pages()
        );
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_trace_order() {
        let trace = matrix_trace(2, 2).unwrap();
        // 2x2 matrices are 16 bytes each
        assert_eq!(trace, vec![0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 40, 44]);
    }

    #[test]
    fn test_matrix_trace_rectangular() {
        let trace = matrix_trace(1, 3).unwrap();
        assert_eq!(trace.len(), 9);
        assert_eq!(trace[3], 12);
        assert_eq!(trace[8], 32);
    }

    #[test]
    fn test_empty_matrix() {
        assert!(matrix_trace(0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_oversized_matrix() {
        assert!(matches!(matrix_trace(40_000, 40_000), Err(SimError::Config(_))));
    }

    #[test]
    fn test_descriptor_for() {
        let descriptor = descriptor_for(128, 4).unwrap();
        assert_eq!(descriptor.rows, 4);
        assert_eq!(descriptor.cols, 4);
        assert_eq!(descriptor.addresses.len(), 48);
        // 192 bytes over 128-byte pages
        assert_eq!(descriptor.virtual_pages(), 2);
    }
}
