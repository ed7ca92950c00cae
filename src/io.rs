use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::constants::*;
use crate::error::{Result, SimError};
use crate::process::Process;

/// Contents of a `proc<i>.txt` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessDescriptor {
    pub page_size: u32,
    pub rows: u32,
    pub cols: u32,
    pub addresses: Vec<u32>,
}

impl ProcessDescriptor {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Parse descriptor text; `path` is only used in error messages
    ///
    /// Header lines other than `TP:`, `NF:` and `NC:` are ignored. Everything
    /// after the address section marker is an address, blank lines excepted.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut descriptor = ProcessDescriptor {
            page_size: DEFAULT_PAGE_SIZE,
            rows: 0,
            cols: 0,
            addresses: Vec::new(),
        };
        let mut in_addresses = false;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();

            if in_addresses {
                if !line.is_empty() {
                    descriptor.addresses.push(parse_field(line, path, line_no, "address")?);
                }
                continue;
            }

            if line.starts_with(ADDRESS_SECTION) {
                in_addresses = true;
            } else if let Some(value) = line.strip_prefix(PAGE_SIZE_KEY) {
                descriptor.page_size = parse_field(value, path, line_no, "page size")?;
            } else if let Some(value) = line.strip_prefix(ROWS_KEY) {
                descriptor.rows = parse_field(value, path, line_no, "row count")?;
            } else if let Some(value) = line.strip_prefix(COLS_KEY) {
                descriptor.cols = parse_field(value, path, line_no, "column count")?;
            }
        }

        if descriptor.page_size == 0 {
            return Err(SimError::Parse {
                path: path.to_path_buf(),
                line: 0,
                message: "page size must be positive".to_string(),
            });
        }

        Ok(descriptor)
    }

    /// Render in the descriptor file format, including the informational
    /// reference and page counts
    pub fn to_file_string(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{} {}\n", PAGE_SIZE_KEY, self.page_size));
        out.push_str(&format!("{} {}\n", ROWS_KEY, self.rows));
        out.push_str(&format!("{} {}\n", COLS_KEY, self.cols));
        out.push_str(&format!("{} {}\n", REFERENCES_KEY, self.addresses.len()));
        out.push_str(&format!("{} {}\n", PAGES_KEY, self.virtual_pages()));
        out.push_str(ADDRESS_SECTION);
        out.push('\n');
        for address in &self.addresses {
            out.push_str(&address.to_string());
            out.push('\n');
        }
        out
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path.as_ref(), self.to_file_string())?;
        Ok(())
    }

    /// Pages spanned by three `rows x cols` matrices of 4-byte elements
    pub fn virtual_pages(&self) -> u64 {
        let bytes = MATRICES_PER_PROCESS as u64
            * self.rows as u64
            * self.cols as u64
            * ELEMENT_SIZE as u64;
        bytes.div_ceil(self.page_size as u64)
    }

    pub fn into_process(self, pid: usize) -> Process {
        Process::new(pid, self.page_size, self.rows, self.cols, self.addresses)
    }
}

fn parse_field<T: std::str::FromStr>(value: &str, path: &Path, line: usize, what: &str) -> Result<T> {
    let value = value.trim();
    value.parse().map_err(|_| SimError::Parse {
        path: path.to_path_buf(),
        line,
        message: format!("invalid {}: {:?}", what, value),
    })
}

/// Load `proc0.txt` .. `proc<count-1>.txt` from `dir`
///
/// Missing or malformed files are logged and skipped; the caller decides
/// whether a short result is fatal.
pub fn load_processes<P: AsRef<Path>>(dir: P, count: usize) -> Vec<Process> {
    let dir = dir.as_ref();
    let mut processes = Vec::with_capacity(count);

    for pid in 0..count {
        let path = dir.join(process_file_name(pid));
        if !path.is_file() {
            warn!("Process file not found: {}", path.display());
            continue;
        }
        match ProcessDescriptor::from_file(&path) {
            Ok(descriptor) => processes.push(descriptor.into_process(pid)),
            Err(e) => warn!("Failed to load process {}: {}", pid, e),
        }
    }

    info!("Loaded {} of {} processes", processes.len(), count);
    processes
}

/// Settings of the trace generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub page_size: u32,
    /// Side length of each process's square matrices
    pub matrix_sides: Vec<u32>,
}

impl GeneratorConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse `TP`, `NPROC` and `TAMS` from properties-style text
    pub fn parse(content: &str) -> Result<Self> {
        let props = parse_properties(content);

        let page_size: u32 = required(&props, "TP")?;
        let processes: usize = required(&props, "NPROC")?;
        let sides_raw = props
            .get("TAMS")
            .ok_or_else(|| SimError::Config("missing key TAMS".to_string()))?;

        if page_size == 0 {
            return Err(SimError::Config("TP must be positive".to_string()));
        }

        let matrix_sides = sides_raw
            .split(',')
            .map(|side| {
                side.trim()
                    .parse::<u32>()
                    .map_err(|_| SimError::Config(format!("invalid matrix size in TAMS: {:?}", side.trim())))
            })
            .collect::<Result<Vec<_>>>()?;

        if matrix_sides.len() != processes {
            return Err(SimError::Config(format!(
                "TAMS lists {} matrix sizes but NPROC is {}",
                matrix_sides.len(),
                processes
            )));
        }

        Ok(GeneratorConfig { page_size, matrix_sides })
    }

    pub fn process_count(&self) -> usize {
        self.matrix_sides.len()
    }
}

fn parse_properties(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .filter_map(|line| {
            let split = line.find(['=', ':'])?;
            let (key, value) = line.split_at(split);
            Some((key.trim().to_string(), value[1..].trim().to_string()))
        })
        .collect()
}

fn required<T: std::str::FromStr>(props: &HashMap<String, String>, key: &str) -> Result<T> {
    let value = props
        .get(key)
        .ok_or_else(|| SimError::Config(format!("missing key {}", key)))?;
    value
        .parse()
        .map_err(|_| SimError::Config(format!("invalid value for {}: {:?}", key, value)))
}

/// Path of the descriptor for `pid` inside `dir`
pub fn process_file_path<P: AsRef<Path>>(dir: P, pid: usize) -> PathBuf {
    dir.as_ref().join(process_file_name(pid))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ProcessDescriptor> {
        ProcessDescriptor::parse(content, Path::new("proc0.txt"))
    }

    #[test]
    fn test_parse_descriptor() {
        let content = "TP: 4096\nNF: 2\nNC: 3\nNR: 18\nNP: 1\nDirecciones:\n0\n4\n\n8\n";
        let descriptor = parse(content).unwrap();

        assert_eq!(descriptor.page_size, 4096);
        assert_eq!(descriptor.rows, 2);
        assert_eq!(descriptor.cols, 3);
        assert_eq!(descriptor.addresses, vec![0, 4, 8]);
    }

    #[test]
    fn test_parse_defaults_and_unknown_headers() {
        let descriptor = parse("comment line\nXX: 5\nDirecciones:\n12\n").unwrap();
        assert_eq!(descriptor.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(descriptor.rows, 0);
        assert_eq!(descriptor.addresses, vec![12]);
    }

    #[test]
    fn test_parse_header_keys_after_marker_are_addresses() {
        let err = parse("Direcciones:\n4\nTP: 8\n").unwrap_err();
        match err {
            SimError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_parse_bad_number() {
        assert!(matches!(parse("TP: abc\nDirecciones:\n"), Err(SimError::Parse { line: 1, .. })));
        assert!(matches!(parse("Direcciones:\n-4\n"), Err(SimError::Parse { line: 2, .. })));
    }

    #[test]
    fn test_parse_zero_page_size() {
        assert!(matches!(parse("TP: 0\nDirecciones:\n0\n"), Err(SimError::Parse { .. })));
    }

    #[test]
    fn test_file_string_layout() {
        let descriptor = ProcessDescriptor {
            page_size: 64,
            rows: 2,
            cols: 2,
            addresses: vec![0, 4],
        };
        let text = descriptor.to_file_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines, vec!["TP: 64", "NF: 2", "NC: 2", "NR: 2", "NP: 1", "Direcciones:", "0", "4"]);
        assert_eq!(parse(&text).unwrap(), descriptor);
    }

    #[test]
    fn test_virtual_pages_rounds_up() {
        let descriptor = ProcessDescriptor {
            page_size: 100,
            rows: 3,
            cols: 3,
            addresses: Vec::new(),
        };
        // 3 * 9 * 4 = 108 bytes
        assert_eq!(descriptor.virtual_pages(), 2);
    }

    #[test]
    fn test_generator_config() {
        let content = "# sample\nTP=512\nNPROC = 2\nTAMS=4, 8\n";
        let config = GeneratorConfig::parse(content).unwrap();
        assert_eq!(config.page_size, 512);
        assert_eq!(config.matrix_sides, vec![4, 8]);
        assert_eq!(config.process_count(), 2);
    }

    #[test]
    fn test_generator_config_colon_separator() {
        let config = GeneratorConfig::parse("TP: 64\nNPROC: 1\nTAMS: 3\n").unwrap();
        assert_eq!(config.matrix_sides, vec![3]);
    }

    #[test]
    fn test_generator_config_errors() {
        assert!(matches!(GeneratorConfig::parse("NPROC=1\nTAMS=4"), Err(SimError::Config(_))));
        assert!(matches!(GeneratorConfig::parse("TP=64\nNPROC=2\nTAMS=4"), Err(SimError::Config(_))));
        assert!(matches!(GeneratorConfig::parse("TP=64\nNPROC=1\nTAMS=x"), Err(SimError::Config(_))));
        assert!(matches!(GeneratorConfig::parse("TP=0\nNPROC=1\nTAMS=4"), Err(SimError::Config(_))));
    }
}
