//! Install-progress hooks for [`crate::compilers::solc::acquire`].
//!
//! The core never formats terminal output itself; it only emits `tracing` events so a CLI
//! frontend can render progress (spinners, plain lines, whatever) without this crate depending
//! on a terminal library beyond the diagnostic coloring in `artifacts::error`.

use semver::Version;

pub fn solc_installation_start(version: &Version) {
    tracing::debug!(%version, "installing solc");
}

pub fn solc_installation_success(version: &Version) {
    tracing::info!(%version, "installed solc");
}

pub fn solc_installation_error(version: &Version, err: &str) {
    tracing::warn!(%version, error = err, "solc installation failed");
}

pub fn cache_reset(reason: &str) {
    tracing::warn!(reason, "resetting incremental cache to empty");
}

pub fn native_compiler_probe_failed(version: &Version, err: &str) {
    tracing::warn!(%version, error = err, "native solc binary failed --version probe, falling back to portable build");
}

pub fn checksum_mismatch_advisory(version: &Version, expected: &str, detected: &str) {
    tracing::warn!(%version, expected, detected, "solc checksum mismatch (advisory, continuing)");
}
