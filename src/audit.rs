//! Violation Audit Export
//!
//! Append-only JSONL writer for violation records, with size-based file
//! rotation. Hosts that keep violations in memory only can skip this
//! module entirely.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Datelike, Timelike, Utc};

use crate::policy::Violation;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Maximum file size before rotation (10 MB)
const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Log file extension
const LOG_EXT: &str = ".jsonl";

// ============================================================================
// WRITER
// ============================================================================

/// Append-only JSONL writer for violations
pub struct AuditWriter {
    writer: BufWriter<File>,
    current_file: PathBuf,
    current_size: u64,
    base_dir: PathBuf,
}

impl AuditWriter {
    /// Create a writer in the given directory, opening a fresh file
    pub fn new(base_dir: PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(&base_dir)?;
        let (current_file, file) = Self::open_new_file(&base_dir)?;

        Ok(Self {
            writer: BufWriter::new(file),
            current_file,
            current_size: 0,
            base_dir,
        })
    }

    fn open_new_file(base_dir: &Path) -> std::io::Result<(PathBuf, File)> {
        let now = Utc::now();
        let filename = format!(
            "violations_{}_{:02}_{:02}_{:02}{:02}{:02}{}",
            now.year(),
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            LOG_EXT
        );
        let file_path = base_dir.join(&filename);

        let file = OpenOptions::new().create(true).append(true).open(&file_path)?;

        log::info!("Opened violation audit log: {:?}", file_path);
        Ok((file_path, file))
    }

    /// Append one violation as a single JSON line and flush
    pub fn record(&mut self, violation: &Violation) -> std::io::Result<()> {
        let line = serde_json::to_string(violation)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let bytes = line.as_bytes();

        if self.current_size + bytes.len() as u64 > MAX_FILE_SIZE {
            self.rotate()?;
        }

        self.writer.write_all(bytes)?;
        self.writer.write_all(b"\n")?;
        self.current_size += bytes.len() as u64 + 1;

        // Flush for durability
        self.writer.flush()
    }

    fn rotate(&mut self) -> std::io::Result<()> {
        self.writer.flush()?;

        let (new_path, new_file) = Self::open_new_file(&self.base_dir)?;
        self.writer = BufWriter::new(new_file);

        log::info!("Rotated audit log {:?} -> {:?}", self.current_file, new_path);
        self.current_file = new_path;
        self.current_size = 0;

        Ok(())
    }

    pub fn current_file(&self) -> &Path {
        &self.current_file
    }
}

// ============================================================================
// READ-BACK
// ============================================================================

/// Read all violations from an audit file, skipping unparseable lines
pub fn read_violations(path: &Path) -> std::io::Result<Vec<Violation>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut violations = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Violation>(&line) {
            Ok(violation) => violations.push(violation),
            Err(e) => log::warn!("Skipping malformed audit line: {}", e),
        }
    }

    Ok(violations)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Severity;
    use tempfile::TempDir;

    fn violation(policy_name: &str) -> Violation {
        Violation {
            timestamp: Utc::now(),
            pod: "web-1".to_string(),
            namespace: "prod".to_string(),
            policy_name: policy_name.to_string(),
            description: "write on /etc/passwd".to_string(),
            severity: Severity::High,
        }
    }

    #[test]
    fn test_writer_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let writer = AuditWriter::new(temp_dir.path().to_path_buf()).unwrap();
        assert!(writer.current_file().exists());
    }

    #[test]
    fn test_record_and_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = AuditWriter::new(temp_dir.path().to_path_buf()).unwrap();

        for i in 0..3 {
            writer.record(&violation(&format!("p{}", i))).unwrap();
        }

        let back = read_violations(writer.current_file()).unwrap();
        assert_eq!(back.len(), 3);
        assert_eq!(back[0].policy_name, "p0");
        assert_eq!(back[2].policy_name, "p2");
    }

    #[test]
    fn test_one_json_object_per_line() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = AuditWriter::new(temp_dir.path().to_path_buf()).unwrap();
        writer.record(&violation("a")).unwrap();
        writer.record(&violation("b")).unwrap();

        let content = std::fs::read_to_string(writer.current_file()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            assert!(serde_json::from_str::<Violation>(line).is_ok());
        }
    }
}
