//! Compiler acquisition: turning a required `solc` version into a runnable binary.
//!
//! Order of attempts, cheapest first:
//! 1. consult the build index (a compiled-in manifest, no network needed to read it);
//! 2. reuse an already-installed binary if one is present and (advisory) checksum-clean;
//! 3. download via `svm` if missing;
//! 4. probe the binary actually runs (`solc --version` within a short timeout);
//! 5. fall back to the portable build if the native probe fails.
//!
//! A per-version file lock (`fs2`) serializes concurrent acquisition of the *same* version across
//! processes so two callers racing to build the same project don't both try to download it.

use super::Solc;
use crate::{config::SolcConfig, utils::RuntimeOrHandle};
use once_cell::sync::Lazy;
use semver::Version;
use std::{fmt, path::PathBuf, time::Duration};

/// The compiled-in build index: a manifest of known solc releases and their SHA256 checksums.
/// Parsing this never touches the network — only an actual binary download does.
static BUILD_INDEX: Lazy<(svm::Releases, Vec<Version>, bool)> =
    Lazy::new(|| match serde_json::from_str::<svm::Releases>(svm_builds::RELEASE_LIST_JSON) {
        Ok(releases) => {
            let sorted = releases.clone().into_versions();
            (releases, sorted, true)
        }
        Err(err) => {
            tracing::error!(%err, "failed to parse embedded solc build index");
            Default::default()
        }
    });

/// All versions the build index knows about, newest first is not guaranteed; callers that need
/// an ordering should sort the result themselves.
pub fn known_versions() -> &'static [Version] {
    &BUILD_INDEX.1
}

#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error("could not acquire solc {version}: {source}")]
    CannotAcquireCompiler { version: Version, source: String },
    #[error("checksum verification failed for solc {version}: expected {expected}, got {detected}")]
    VerifyFailed { version: Version, expected: String, detected: String },
    #[error("no known solc build for version {0} on this platform")]
    PlatformUnsupported(Version),
    #[error("offline mode forbids acquiring solc {0}")]
    Offline(Version),
}

impl From<AcquisitionError> for crate::error::SolcError {
    fn from(err: AcquisitionError) -> Self {
        use crate::error::SolcError;
        match err {
            AcquisitionError::CannotAcquireCompiler { version, source } => {
                SolcError::CannotAcquireCompiler(version, source)
            }
            AcquisitionError::VerifyFailed { version, expected, detected } => {
                SolcError::ChecksumMismatch { version, expected, detected }
            }
            AcquisitionError::PlatformUnsupported(version) => SolcError::PlatformUnsupported(version),
            AcquisitionError::Offline(version) => SolcError::Offline(version),
        }
    }
}

/// A located, runnable compiler: either the native binary or the portable (WASM/JS) fallback.
#[derive(Debug, Clone)]
pub struct SolcBuild {
    pub version: Version,
    pub long_version: Version,
    pub compiler_path: PathBuf,
    pub is_portable: bool,
}

impl fmt::Display for SolcBuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "solc {} ({}{})",
            self.version,
            self.compiler_path.display(),
            if self.is_portable { ", portable" } else { "" }
        )
    }
}

/// Points `svm` (and therefore every `version_path`/`install` call below) at the directory
/// `compilers_cache_dir` resolves to, so a `CACHE_DIR` override actually relocates where compiler
/// binaries get cached instead of only affecting `compilers_cache_dir`'s own return value.
fn sync_svm_home() {
    if let Ok(dir) = crate::config::compilers_cache_dir() {
        std::env::set_var("SVM_HOME", dir);
    }
}

/// Acquires a runnable `solc` for `version`, installing it if necessary.
pub fn acquire(version: &Version, config: &SolcConfig) -> Result<SolcBuild, AcquisitionError> {
    sync_svm_home();
    let _lock = lock_version(version);

    let binary_path = {
        let mut p = svm::version_path(version.to_string().as_str());
        p.push(format!("solc-{version}"));
        p
    };

    if !binary_path.is_file() {
        if config.offline {
            return Err(AcquisitionError::Offline(version.clone()));
        }
        install(version)?;
    }

    if let Err((expected, detected)) = verify_checksum(version, &binary_path) {
        if config.strict_checksum {
            return Err(AcquisitionError::VerifyFailed { version: version.clone(), expected, detected });
        }
        crate::report::checksum_mismatch_advisory(version, &expected, &detected);
    }

    match Solc::probe_version(&binary_path, Duration::from_secs(10)) {
        Ok(probed) => Ok(SolcBuild {
            version: version.clone(),
            long_version: probed,
            compiler_path: binary_path,
            is_portable: false,
        }),
        Err(err) => {
            crate::report::native_compiler_probe_failed(version, &err.to_string());
            super::portable::acquire_portable(version)
                .map_err(|source| AcquisitionError::CannotAcquireCompiler {
                    version: version.clone(),
                    source: source.to_string(),
                })
        }
    }
}

fn install(version: &Version) -> Result<(), AcquisitionError> {
    if !known_versions().is_empty() && !known_versions().contains(version) {
        return Err(AcquisitionError::PlatformUnsupported(version.clone()));
    }

    crate::report::solc_installation_start(version);
    // `svm::install` (the async entry point) is used rather than `svm::blocking_install`: the
    // underlying `reqwest::blocking::Client` misbehaves when called from inside an existing
    // Tokio runtime, so we drive the async function from a throwaway/blocking handle instead.
    match RuntimeOrHandle::new().block_on(svm::install(version)) {
        Ok(_path) => {
            crate::report::solc_installation_success(version);
            Ok(())
        }
        Err(err) => {
            crate::report::solc_installation_error(version, &err.to_string());
            Err(AcquisitionError::CannotAcquireCompiler {
                version: version.clone(),
                source: err.to_string(),
            })
        }
    }
}

/// Compares the installed binary's SHA256 digest against the build index. Returns `Ok(())` if
/// the index had no entry to compare against at all (fetch of the index itself failed at
/// startup) — there is nothing to be strict about in that case.
fn verify_checksum(version: &Version, binary_path: &std::path::Path) -> Result<(), (String, String)> {
    if !BUILD_INDEX.2 {
        return Ok(());
    }
    #[cfg(windows)]
    {
        // Pre-0.7.2 binaries were released as bare .exe files with no published checksum.
        if *version < Version::new(0, 7, 2) {
            return Ok(());
        }
    }

    let Ok(content) = std::fs::read(binary_path) else { return Ok(()) };
    use sha2::Digest;
    let mut hasher = sha2::Sha256::new();
    hasher.update(content);
    let detected_bytes = hasher.finalize();

    let Some(expected_bytes) = BUILD_INDEX.0.get_checksum(version) else { return Ok(()) };
    if detected_bytes.as_slice() == expected_bytes.as_slice() {
        Ok(())
    } else {
        Err((hex::encode(expected_bytes), hex::encode(detected_bytes)))
    }
}

/// Holds an advisory, best-effort per-version lock for the duration of acquisition so two
/// processes racing to build the same project don't both try to download the same binary. A
/// failure to acquire the lock (e.g. the platform doesn't support file locking) is not fatal —
/// worst case is a redundant download, not corruption, since installs are write-once-rename.
fn lock_version(version: &Version) -> Option<std::fs::File> {
    use fs2::FileExt;
    let dir = svm::version_path(version.to_string().as_str());
    std::fs::create_dir_all(&dir).ok()?;
    let lock_path = dir.join(".lock");
    let file = std::fs::OpenOptions::new().create(true).write(true).open(lock_path).ok()?;
    file.lock_exclusive().ok()?;
    Some(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_index_parses_without_network() {
        assert!(!known_versions().is_empty(), "embedded release manifest should always parse");
    }
}
