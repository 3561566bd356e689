//! The portable (WASM/JS) compiler fallback: used when a native `solc` binary is
//! unavailable for the host platform, or fails its liveness probe (crashes, missing shared
//! libraries, unsupported OS/arch).
//!
//! Running an actual WASM build of solc means embedding a JS/WASM engine, which is a large,
//! platform-specific dependency this crate does not take a position on — callers that need the
//! portable path (CI images without a native solc, exotic architectures) supply their own
//! evaluator by implementing [`PortableCompiler`] and registering it with [`set_provider`].
//! Without a registered provider, acquisition simply reports that no portable build is available,
//! the same outcome as if neither path existed.

use super::SolcBuild;
use crate::{
    artifacts::{CompilerOutput, SolcInput},
    error::{Result, SolcError},
};
use once_cell::sync::OnceCell;
use semver::Version;
use std::{path::PathBuf, sync::Arc};

/// A caller-supplied portable compiler backend. Implementations typically wrap a JS engine
/// (e.g. one hosting `soljson.js`) or a WASM runtime; this crate has no opinion on which.
pub trait PortableCompiler: Send + Sync {
    /// Returns the on-disk (or virtual) path to a `version`-matching portable build, fetching it
    /// if necessary. The returned path is opaque to this crate — it is only ever handed back to
    /// the same provider's [`PortableCompiler::compile`] call for that version.
    fn locate(&self, version: &Version) -> Result<PathBuf>;

    /// Evaluates `input` in-process against the build `locate` returned for `version`, returning
    /// the same Standard JSON output shape the native binary would produce. Never spawned as a
    /// subprocess — `path` is whatever `locate` returned and is meaningful only to this provider.
    fn compile(&self, version: &Version, path: &std::path::Path, input: &SolcInput) -> Result<CompilerOutput>;
}

static PROVIDER: OnceCell<Arc<dyn PortableCompiler>> = OnceCell::new();

/// Registers the process-wide portable compiler backend. Calling this more than once is a no-op
/// after the first call wins — acquisition only ever needs one provider per process.
pub fn set_provider(provider: Arc<dyn PortableCompiler>) {
    let _ = PROVIDER.set(provider);
}

pub(super) fn acquire_portable(version: &Version) -> Result<SolcBuild> {
    let provider = PROVIDER.get().ok_or_else(|| {
        SolcError::msg(format!(
            "no native solc {version} available and no portable compiler provider is registered"
        ))
    })?;
    let compiler_path = provider.locate(version)?;
    Ok(SolcBuild {
        version: version.clone(),
        long_version: version.clone(),
        compiler_path,
        is_portable: true,
    })
}

/// Runs `input` through the registered provider rather than spawning `path` as a subprocess.
/// Only ever called for a [`SolcBuild`] whose `is_portable` flag `acquire_portable` set.
pub(crate) fn compile_portable(
    version: &Version,
    path: &std::path::Path,
    input: &SolcInput,
) -> Result<CompilerOutput> {
    let provider = PROVIDER.get().ok_or_else(|| {
        SolcError::msg(format!("no portable compiler provider registered to compile solc {version}"))
    })?;
    provider.compile(version, path, input)
}
