//! Throwaway project workspaces for integration-style tests.
//!
//! Gated behind the `project-util` feature so production builds don't pull in `tempfile` and
//! `fs_extra` by default; the orchestrator itself has no use for a scratch directory.

use crate::{
    config::{ProjectPathsConfig, ProjectPathsConfigBuilder},
    error::{Result, SolcError},
    utils::create_parent_dir_all,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// commonly used options for copying entire folders
fn dir_copy_options() -> fs_extra::dir::CopyOptions {
    fs_extra::dir::CopyOptions {
        overwrite: true,
        skip_exist: false,
        buffer_size: 64 * 1024,
        copy_inside: true,
        content_only: true,
        depth: 0,
    }
}

/// A project workspace rooted in a fresh temporary directory, removed on drop.
pub struct TempProject {
    root: TempDir,
    pub paths: ProjectPathsConfig,
}

impl TempProject {
    /// Creates an empty workspace with the conventional `src`/`out`/`cache` layout under a new
    /// temp dir.
    pub fn new() -> Result<Self> {
        Self::with_paths(ProjectPathsConfig::builder())
    }

    /// Creates a workspace from a caller-supplied paths builder, rooting it at a new temp dir.
    pub fn with_paths(paths: ProjectPathsConfigBuilder) -> Result<Self> {
        let root =
            tempfile::Builder::new().prefix("solc-build-core-").tempdir().map_err(|err| {
                SolcError::io(err, "temp project directory")
            })?;
        let paths = paths.root(root.path()).build()?;
        create_parent_dir_all(&paths.sources)?;
        create_parent_dir_all(&paths.artifacts)?;
        Ok(Self { root, paths })
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Writes `content` to `src/<name>` (appending `.sol` if the name has no extension),
    /// returning the forward-slash [`crate::resolver::SourceName`] the resolver will know it by.
    pub fn add_source(&self, name: &str, content: &str) -> Result<PathBuf> {
        let name = if Path::new(name).extension().is_some() { name.to_string() } else { format!("{name}.sol") };
        let path = self.paths.sources.join(&name);
        if let Some(parent) = path.parent() {
            create_parent_dir_all(parent)?;
        }
        std::fs::write(&path, content).map_err(|err| SolcError::io(err, &path))?;
        Ok(PathBuf::from(name))
    }

    /// Writes `content` under the first configured library directory, creating the directory
    /// (and a default `lib` entry) if none has been configured yet.
    pub fn add_lib(&mut self, package: &str, name: &str, content: &str) -> Result<PathBuf> {
        if self.paths.libraries.is_empty() {
            let lib_dir = self.root().join("lib");
            create_parent_dir_all(&lib_dir)?;
            self.paths.libraries.push(lib_dir);
        }
        let lib_dir = self.paths.libraries[0].join(package);
        let name = if name.ends_with(".sol") { name.to_string() } else { format!("{name}.sol") };
        let path = lib_dir.join(&name);
        if let Some(parent) = path.parent() {
            create_parent_dir_all(parent)?;
        }
        std::fs::write(&path, content).map_err(|err| SolcError::io(err, &path))?;
        Ok(Path::new(package).join(name))
    }

    /// Copies an on-disk fixture directory's contents into this workspace's source directory.
    pub fn copy_fixture(&self, fixture_dir: impl AsRef<Path>) -> Result<()> {
        fs_extra::dir::copy(fixture_dir.as_ref(), &self.paths.sources, &dir_copy_options())
            .map_err(|err| SolcError::msg(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_source_lands_under_the_configured_sources_dir() {
        let project = TempProject::new().unwrap();
        let name = project.add_source("Foo", "pragma solidity ^0.8.0;\ncontract Foo {}\n").unwrap();
        assert_eq!(name, PathBuf::from("Foo.sol"));
        assert!(project.paths.sources.join("Foo.sol").is_file());
    }

    #[test]
    fn add_lib_registers_a_library_directory() {
        let mut project = TempProject::new().unwrap();
        assert!(project.paths.libraries.is_empty());
        project.add_lib("forge-std", "Test", "pragma solidity ^0.8.0;\ncontract Test {}\n").unwrap();
        assert_eq!(project.paths.libraries.len(), 1);
        assert!(project.paths.libraries[0].join("forge-std/Test.sol").is_file());
    }
}
