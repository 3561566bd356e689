//! The `ArtifactStore` boundary: the orchestrator's only way of persisting compiled contracts,
//! build-info records, and discovering what's obsolete after a build. The concrete on-disk
//! artifact format downstream tooling reads is deliberately not this crate's concern — this is
//! the seam a caller implements to plug one in.

use crate::{artifacts::Contract, buildinfo::BuildInfo, error::Result};
use std::path::PathBuf;

/// An external collaborator that knows how to write and query compiled artifacts. The
/// orchestrator never inspects the artifact format itself; it only calls through this trait.
pub trait ArtifactStore {
    /// Persists one compiled contract, identified by its fully qualified name
    /// (`<source_name>:<contract_name>`), alongside the path of the build-info record it came
    /// from.
    fn save_artifact(
        &mut self,
        fully_qualified_name: &str,
        contract: &Contract,
        build_info_path: &std::path::Path,
    ) -> Result<()>;

    /// Persists a build-info record and returns the path it was written to, so
    /// [`ArtifactStore::save_artifact`] calls for the same job can reference it.
    fn save_build_info(&mut self, info: &BuildInfo) -> Result<PathBuf>;

    /// `true` if the named artifact is still present on disk; used by
    /// [`crate::cache::CompilerCache::invalidate_missing_artifacts`] to detect artifacts removed
    /// outside of a build.
    fn artifact_exists(&self, fully_qualified_name: &str) -> bool;

    /// Deletes every artifact in `fully_qualified_names` — the files the incremental cache no
    /// longer references after a build.
    fn remove_obsolete(&mut self, fully_qualified_names: &[String]) -> Result<()>;

    /// Deletes build-info records that are no longer referenced by any surviving artifact. A
    /// store that doesn't track referential staleness at this granularity may treat this as a
    /// no-op; it exists so stores that do can reclaim space after a build.
    fn remove_obsolete_build_infos(&mut self) -> Result<()>;
}
