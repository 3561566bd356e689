//! The on-disk incremental-build cache: one JSON document keyed by source path, used to skip
//! recompiling files whose content and chosen compiler config haven't changed, and to notice
//! when an emitted artifact has been deleted out from under it.

use crate::{error::Result, job::CompilerConfig, report, utils};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::SystemTime,
};

/// Bumped when [`CacheEntry`]'s shape changes in a way older readers can't tolerate. A mismatch
/// is a soft reset, never a hard failure: a build should never block on a stale cache file.
pub const CACHE_FORMAT: &str = "solidity-files-cache-1";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub last_modification_time: SystemTime,
    pub content_hash: String,
    pub source_name: PathBuf,
    pub solc_config: CompilerConfig,
    pub imports: Vec<PathBuf>,
    pub version_pragmas: Vec<String>,
    pub emitted_artifacts: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompilerCache {
    #[serde(rename = "_format")]
    format: String,
    files: BTreeMap<PathBuf, CacheEntry>,
}

impl Default for CompilerCache {
    fn default() -> Self {
        Self { format: CACHE_FORMAT.to_string(), files: BTreeMap::new() }
    }
}

impl CompilerCache {
    /// Loads the cache file at `path`. A missing file is silently a fresh, empty cache; a file
    /// that fails to parse or carries an unrecognized schema tag is also treated as empty, but
    /// logged, since that indicates something unexpected rather than a first run.
    pub fn read(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match utils::read_json_file::<Self>(path) {
            Ok(cache) if cache.format == CACHE_FORMAT => cache,
            Ok(_) => {
                report::cache_reset("cache file has an incompatible schema version");
                Self::default()
            }
            Err(_) => {
                report::cache_reset("cache file could not be parsed");
                Self::default()
            }
        }
    }

    /// Writes the cache atomically (temp file + rename), so a crash mid-write never leaves a
    /// truncated cache file for the next run to choke on.
    pub fn write(&self, path: &Path) -> Result<()> {
        utils::write_json_file(self, path)
    }

    /// `true` if `path` must be recompiled: no entry exists, its content hash differs, or (when
    /// `solc_config` is `Some`, i.e. `path` is artifact-emitting in the candidate job) its last
    /// compiler config differs. Callers checking a pure dependency pass `None`, since a
    /// dependency's own config never gates its artifact-emitting importer's cache hit.
    pub fn has_file_changed(
        &self,
        path: &Path,
        content_hash: &str,
        solc_config: Option<&CompilerConfig>,
    ) -> bool {
        match self.files.get(path) {
            None => true,
            Some(entry) => {
                if entry.content_hash != content_hash {
                    return true;
                }
                if let Some(config) = solc_config {
                    if &entry.solc_config != config {
                        return true;
                    }
                }
                false
            }
        }
    }

    /// Drops any entry for which `artifact_exists` reports a missing emitted artifact,
    /// compensating for artifacts removed outside of a build.
    pub fn invalidate_missing_artifacts(&mut self, artifact_exists: impl Fn(&str) -> bool) {
        self.files
            .retain(|_, entry| entry.emitted_artifacts.iter().all(|name| artifact_exists(name)));
    }

    pub fn insert(&mut self, path: PathBuf, entry: CacheEntry) {
        self.files.insert(path, entry);
    }

    pub fn remove(&mut self, path: &Path) -> Option<CacheEntry> {
        self.files.remove(path)
    }

    pub fn get(&self, path: &Path) -> Option<&CacheEntry> {
        self.files.get(path)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&PathBuf, &CacheEntry)> {
        self.files.iter()
    }

    /// Keeps only the entries for `valid_paths`, returning the ones dropped — used by the
    /// orchestrator to know which previously-emitted artifacts are now obsolete.
    pub fn retain_only(&mut self, valid_paths: &std::collections::BTreeSet<PathBuf>) -> Vec<CacheEntry> {
        let mut dropped = Vec::new();
        self.files.retain(|path, entry| {
            let keep = valid_paths.contains(path);
            if !keep {
                dropped.push(entry.clone());
            }
            keep
        });
        dropped
    }
}
