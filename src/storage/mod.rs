//! Persistence layer.
//!
//! The submission log is the only state that survives a run: a plain
//! text file, one canonical combination key per line, append-only. It is
//! read fully at startup to seed the exclusion set and appended to
//! (write-through) after each successful submission, so a crash mid-run
//! never loses a confirmed entry and a restarted run never double-submits.
//!
//! Also writes the per-run audit file of all joined legs.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::Leg;

// ---------------------------------------------------------------------------
// Submission log
// ---------------------------------------------------------------------------

/// Append-only store of submitted combination keys.
///
/// Injected into the generator (exclusion set) and the driver
/// (write-through appends) so tests can run against an in-memory fake.
pub trait SubmissionLog {
    fn contains(&self, key: &str) -> bool;

    /// Persist a key. Must be durable before returning: the driver
    /// depends on the write landing before the next submission decision.
    fn append(&mut self, key: &str) -> Result<()>;

    /// The full exclusion set, for seeding generation.
    fn keys(&self) -> &HashSet<String>;
}

/// File-backed log, one key per line.
pub struct FileSubmissionLog {
    path: PathBuf,
    file: File,
    keys: HashSet<String>,
}

impl FileSubmissionLog {
    /// Open (or create) the log and load all previously submitted keys.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let keys: HashSet<String> = if path.exists() {
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read submission log {}", path.display()))?
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect()
        } else {
            HashSet::new()
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open submission log {}", path.display()))?;

        info!(path = %path.display(), keys = keys.len(), "Submission log loaded");
        Ok(Self { path, file, keys })
    }
}

impl SubmissionLog for FileSubmissionLog {
    fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    fn append(&mut self, key: &str) -> Result<()> {
        writeln!(self.file, "{key}")
            .with_context(|| format!("Failed to append to submission log {}", self.path.display()))?;
        self.file
            .flush()
            .with_context(|| format!("Failed to flush submission log {}", self.path.display()))?;
        self.keys.insert(key.to_string());
        debug!(key, "Submission key persisted");
        Ok(())
    }

    fn keys(&self) -> &HashSet<String> {
        &self.keys
    }
}

/// In-memory log for tests.
#[derive(Debug, Default)]
pub struct MemorySubmissionLog {
    keys: HashSet<String>,
}

impl MemorySubmissionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys(keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }
}

impl SubmissionLog for MemorySubmissionLog {
    fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    fn append(&mut self, key: &str) -> Result<()> {
        self.keys.insert(key.to_string());
        Ok(())
    }

    fn keys(&self) -> &HashSet<String> {
        &self.keys
    }
}

// ---------------------------------------------------------------------------
// Audit file
// ---------------------------------------------------------------------------

/// Write the per-run audit table of all joined legs, PLAY or not.
/// Overwritten each run; the submission log is the durable record.
pub fn write_audit(legs: &[Leg], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let mut out = String::with_capacity(legs.len() * 96 + 128);
    out.push_str(
        "prop_id,game_id,player_id,player_name,league_id,market_key,line,\
         fair_over,fair_under,direction,play,commence_time\n",
    );
    for leg in legs {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{:.6},{:.6},{},{},{}\n",
            leg.prop_id,
            leg.game_id,
            leg.player_id,
            leg.player_name,
            leg.league_id,
            leg.market_key,
            leg.line,
            leg.fair_over,
            leg.fair_under,
            leg.direction,
            if leg.play { "PLAY" } else { "no play" },
            leg.commence_time.to_rfc3339(),
        ));
    }

    std::fs::write(path, out)
        .with_context(|| format!("Failed to write audit file {}", path.display()))?;

    info!(path = %path.display(), legs = legs.len(), "Audit file written");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(suffix: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("propline_test_{}_{suffix}", uuid::Uuid::new_v4()));
        p
    }

    #[test]
    fn test_open_nonexistent_starts_empty() {
        let path = temp_path("log.txt");
        let log = FileSubmissionLog::open(&path).unwrap();
        assert!(log.keys().is_empty());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_and_reload() {
        let path = temp_path("log.txt");
        {
            let mut log = FileSubmissionLog::open(&path).unwrap();
            log.append("p1|p2|p3").unwrap();
            log.append("p4|p5|p6").unwrap();
            assert!(log.contains("p1|p2|p3"));
        }

        let log = FileSubmissionLog::open(&path).unwrap();
        assert_eq!(log.keys().len(), 2);
        assert!(log.contains("p1|p2|p3"));
        assert!(log.contains("p4|p5|p6"));
        assert!(!log.contains("p7|p8|p9"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_skips_blank_lines() {
        let path = temp_path("log.txt");
        std::fs::write(&path, "p1|p2|p3\n\n  \np4|p5|p6\n").unwrap();

        let log = FileSubmissionLog::open(&path).unwrap();
        assert_eq!(log.keys().len(), 2);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let mut path = temp_path("nested");
        path.push("deeper");
        path.push("log.txt");

        let mut log = FileSubmissionLog::open(&path).unwrap();
        log.append("k").unwrap();
        assert!(path.exists());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_memory_log() {
        let mut log = MemorySubmissionLog::with_keys(["a|b".to_string()]);
        assert!(log.contains("a|b"));
        assert!(!log.contains("c|d"));
        log.append("c|d").unwrap();
        assert!(log.contains("c|d"));
        assert_eq!(log.keys().len(), 2);
    }

    #[test]
    fn test_write_audit() {
        let path = temp_path("audit.csv");
        let mut legs = vec![
            crate::types::Leg::sample("p1", "g1", "pl1"),
            crate::types::Leg::sample("p2", "g2", "pl2"),
        ];
        legs[1].play = false;

        write_audit(&legs, &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3); // header + 2 legs
        assert!(lines[0].starts_with("prop_id,game_id,player_id"));
        assert!(lines[1].contains("PLAY"));
        assert!(lines[2].contains("no play"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_audit_empty() {
        let path = temp_path("audit.csv");
        write_audit(&[], &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        std::fs::remove_file(&path).unwrap();
    }
}
