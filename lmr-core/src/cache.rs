//! Persisted CC-candidate cache (§6 "Persisted state"). Keyed by
//! `(WACN, SYSID)`, one file per system under the cache directory, holding
//! one `frequency_hz` per line with optional `#`-prefixed comments.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Resolves the cache root, honouring `XDG_CACHE_HOME` and falling back to
/// `$HOME/.cache/dsd-neo` (§6: "default `$XDG_CACHE_HOME/dsd-neo` or
/// equivalent").
pub fn default_cache_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        if !xdg.is_empty() {
            return PathBuf::from(xdg).join("dsd-neo");
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".cache").join("dsd-neo");
    }
    PathBuf::from(".cache").join("dsd-neo")
}

fn file_name(wacn: u32, sysid: u16) -> String {
    format!("{wacn:06x}_{sysid:04x}.candidates")
}

/// Candidate-file store rooted at `dir`.
#[derive(Debug, Clone)]
pub struct CandidateCache {
    dir: PathBuf,
}

impl CandidateCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn default_location() -> Self {
        Self::new(default_cache_dir())
    }

    fn path_for(&self, wacn: u32, sysid: u16) -> PathBuf {
        self.dir.join(file_name(wacn, sysid))
    }

    /// Reads the candidate list for `(wacn, sysid)`. Missing file is not an
    /// error: an unknown system simply has no candidates yet.
    pub fn load(&self, wacn: u32, sysid: u16) -> io::Result<Vec<u64>> {
        let path = self.path_for(wacn, sysid);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(parse_candidates(&text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Overwrites the candidate file for `(wacn, sysid)`, creating the
    /// cache directory if needed. Frequencies are deduplicated and written
    /// in ascending order for a stable diff across runs.
    pub fn store(&self, wacn: u32, sysid: u16, frequencies: &[u64]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(wacn, sysid);
        let mut sorted: Vec<u64> = frequencies.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let tmp = path.with_extension("tmp");
        {
            let mut f = fs::File::create(&tmp)?;
            writeln!(f, "# CC candidates for WACN={wacn:06x} SYSID={sysid:04x}")?;
            for freq in &sorted {
                writeln!(f, "{freq}")?;
            }
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Merges `new_candidates` into the existing file, preserving ones
    /// already on disk.
    pub fn merge(&self, wacn: u32, sysid: u16, new_candidates: &[u64]) -> io::Result<Vec<u64>> {
        let mut existing = self.load(wacn, sysid)?;
        existing.extend_from_slice(new_candidates);
        self.store(wacn, sysid, &existing)?;
        existing.sort_unstable();
        existing.dedup();
        Ok(existing)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn parse_candidates(text: &str) -> Vec<u64> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.parse::<u64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("lmr-cache-test-{tag}-{}", std::process::id()));
        dir
    }

    #[test]
    fn parse_candidates_skips_comments_and_blank_lines() {
        let text = "# header\n852000000\n\n853000000\n# trailing\n";
        assert_eq!(parse_candidates(text), vec![852_000_000, 853_000_000]);
    }

    #[test]
    fn load_missing_file_returns_empty() {
        let cache = CandidateCache::new(temp_dir("missing"));
        let result = cache.load(0xBEE00, 0x1234).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn store_then_load_round_trips() {
        let dir = temp_dir("roundtrip");
        let cache = CandidateCache::new(&dir);
        cache.store(0xBEE00, 0x1234, &[853_000_000, 852_000_000, 852_000_000]).unwrap();
        let loaded = cache.load(0xBEE00, 0x1234).unwrap();
        assert_eq!(loaded, vec![852_000_000, 853_000_000]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn merge_preserves_existing_entries() {
        let dir = temp_dir("merge");
        let cache = CandidateCache::new(&dir);
        cache.store(0x1, 0x2, &[100]).unwrap();
        let merged = cache.merge(0x1, 0x2, &[200, 100]).unwrap();
        assert_eq!(merged, vec![100, 200]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn different_systems_use_distinct_files() {
        let dir = temp_dir("distinct");
        let cache = CandidateCache::new(&dir);
        cache.store(0x1, 0x2, &[100]).unwrap();
        cache.store(0x1, 0x3, &[200]).unwrap();
        assert_eq!(cache.load(0x1, 0x2).unwrap(), vec![100]);
        assert_eq!(cache.load(0x1, 0x3).unwrap(), vec![200]);
        let _ = fs::remove_dir_all(&dir);
    }
}
