//! Project path and compiler-default configuration.

use crate::{
    artifacts::SolcSettings,
    error::{Result, SolcError},
    remappings::Remapping,
    utils,
};
use std::{
    collections::BTreeSet,
    env,
    path::{Path, PathBuf},
};

/// Root-relative project layout: where sources, libraries, the cache file and build output live.
#[derive(Clone, Debug)]
pub struct ProjectPathsConfig {
    pub root: PathBuf,
    pub sources: PathBuf,
    pub artifacts: PathBuf,
    pub build_infos: PathBuf,
    pub cache: PathBuf,
    pub libraries: Vec<PathBuf>,
    pub remappings: Vec<Remapping>,
}

impl ProjectPathsConfig {
    pub fn builder() -> ProjectPathsConfigBuilder {
        ProjectPathsConfigBuilder::default()
    }

    /// All directories solc is allowed to read from: the project root, every library, and every
    /// remapping target.
    pub fn allowed_paths(&self) -> BTreeSet<PathBuf> {
        let mut allowed = BTreeSet::new();
        allowed.insert(self.root.clone());
        allowed.extend(self.libraries.iter().cloned());
        for remapping in &self.remappings {
            allowed.insert(PathBuf::from(&remapping.path));
        }
        allowed
    }

    /// Directories under which a third-party import may live, in addition to `sources`.
    pub fn include_paths(&self) -> BTreeSet<PathBuf> {
        let mut include = BTreeSet::new();
        include.insert(self.sources.clone());
        include.extend(self.libraries.iter().cloned());
        include
    }

    /// Converts an absolute path under the project root or a library into a forward-slash
    /// [`crate::resolver::SourceName`].
    pub fn source_name(&self, path: &Path) -> PathBuf {
        utils::source_name(path, &self.root)
    }
}

#[derive(Default)]
pub struct ProjectPathsConfigBuilder {
    root: Option<PathBuf>,
    sources: Option<PathBuf>,
    artifacts: Option<PathBuf>,
    build_infos: Option<PathBuf>,
    cache: Option<PathBuf>,
    libraries: Vec<PathBuf>,
    remappings: Vec<Remapping>,
}

impl ProjectPathsConfigBuilder {
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn sources(mut self, sources: impl Into<PathBuf>) -> Self {
        self.sources = Some(sources.into());
        self
    }

    pub fn artifacts(mut self, artifacts: impl Into<PathBuf>) -> Self {
        self.artifacts = Some(artifacts.into());
        self
    }

    pub fn cache(mut self, cache: impl Into<PathBuf>) -> Self {
        self.cache = Some(cache.into());
        self
    }

    pub fn lib(mut self, lib: impl Into<PathBuf>) -> Self {
        self.libraries.push(lib.into());
        self
    }

    pub fn libraries(mut self, libs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.libraries.extend(libs);
        self
    }

    pub fn remapping(mut self, remapping: Remapping) -> Self {
        self.remappings.push(remapping);
        self
    }

    pub fn build(self) -> Result<ProjectPathsConfig> {
        let root = match self.root {
            Some(root) => utils::canonicalize(root)?,
            None => utils::canonicalize(env::current_dir().map_err(|e| {
                SolcError::msg(format!("failed to read current directory: {e}"))
            })?)?,
        };
        let sources = self.sources.unwrap_or_else(|| root.join("src"));
        let artifacts = self.artifacts.unwrap_or_else(|| root.join("out"));
        let build_infos = self.build_infos.unwrap_or_else(|| artifacts.join("build-info"));
        let cache = self.cache.unwrap_or_else(|| root.join("cache").join("solidity-files-cache.json"));

        Ok(ProjectPathsConfig {
            root,
            sources,
            artifacts,
            build_infos,
            cache,
            libraries: self.libraries,
            remappings: self.remappings,
        })
    }
}

/// Default compiler settings plus the offline/strict-checksum toggles (`OFFLINE` and strict
/// checksum verification are both opt-in, not hardwired).
#[derive(Clone, Debug, Default)]
pub struct SolcConfig {
    pub settings: SolcSettings,
    pub offline: bool,
    pub strict_checksum: bool,
}

impl SolcConfig {
    pub fn from_env() -> Self {
        Self {
            settings: SolcSettings::default(),
            offline: env::var_os("OFFLINE").is_some(),
            strict_checksum: false,
        }
    }
}

/// Root directory used to cache downloaded compiler binaries, overridable via `CACHE_DIR`.
pub fn compilers_cache_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("CACHE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir()
        .ok_or_else(|| SolcError::msg("could not determine home directory for compiler cache"))?;
    Ok(home.join(".svm"))
}
