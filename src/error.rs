//! The crate-wide error type.

use semver::Version;
use std::{
    io,
    path::{Path, PathBuf},
};

pub type Result<T, E = SolcError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum SolcError {
    #[error("{0}")]
    Io(#[from] SolcIoError),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    SemVer(#[from] semver::Error),

    #[cfg(feature = "svm-solc")]
    #[error(transparent)]
    Svm(#[from] svm::SvmError),

    /// A source file imports a path that cannot be resolved within the project root or any
    /// configured library.
    #[error("{0}: illegal import \"{1}\"")]
    IllegalImport(PathBuf, String),

    /// A source file could not be found for the given source name.
    #[error("source `{0}` not found")]
    FileNotFound(String),

    /// A third-party import references a package that is not installed under any library path.
    #[error("package `{0}` is not installed")]
    PackageNotInstalled(String),

    /// One or more files failed job planning; see [`crate::job::JobCreationError`].
    #[error("failed to plan {0} compilation job(s)")]
    Planning(usize),

    /// The requested solc version could not be acquired natively nor via the portable fallback.
    #[error("could not acquire solc {0}: {1}")]
    CannotAcquireCompiler(Version, String),

    /// The downloaded/cached binary's digest did not match the build index.
    #[error("checksum mismatch for solc {version}: expected {expected}, got {detected}")]
    ChecksumMismatch { version: Version, expected: String, detected: String },

    /// The platform has no known native or portable build for the given version.
    #[error("unsupported platform for solc {0}")]
    PlatformUnsupported(Version),

    /// solc exited with a non-zero status.
    #[error("solc {0:?} exited with {1}:\n{2}")]
    SolcError(Option<Version>, std::process::ExitStatus, String),

    /// The compiler produced output that could not be parsed as the Standard JSON schema.
    #[error("compiler protocol error: {0}")]
    CompilerProtocol(String),

    /// No allowed compiler config satisfies this offline/strict constraint.
    #[error("offline mode forbids acquiring solc {0}")]
    Offline(Version),

    #[error("{0}")]
    Message(String),
}

impl SolcError {
    /// The process exit code a CLI frontend should use for this error: `1` for compiler
    /// diagnostics, `2` for planning failures, `3` for acquisition failures, `1` for everything
    /// else. Success (`0`) has no corresponding error value.
    pub fn exit_code(&self) -> i32 {
        match self {
            SolcError::Planning(_) => 2,
            SolcError::CannotAcquireCompiler(..)
            | SolcError::ChecksumMismatch { .. }
            | SolcError::PlatformUnsupported(_)
            | SolcError::Offline(_) => 3,
            #[cfg(feature = "svm-solc")]
            SolcError::Svm(_) => 3,
            _ => 1,
        }
    }

    pub fn io(err: io::Error, path: impl Into<PathBuf>) -> Self {
        SolcIoError::new(err, path).into()
    }

    pub fn msg(msg: impl std::fmt::Display) -> Self {
        SolcError::Message(msg.to_string())
    }

    /// Builds an error from a failed solc invocation's captured output.
    pub fn solc_output(version: Option<Version>, output: &std::process::Output) -> Self {
        let mut msg = String::from_utf8_lossy(&output.stderr);
        let mut trimmed = msg.trim();
        if trimmed.is_empty() {
            msg = String::from_utf8_lossy(&output.stdout);
            trimmed = msg.trim();
            if trimmed.is_empty() {
                trimmed = "<empty output>";
            }
        }
        SolcError::SolcError(version, output.status, trimmed.into())
    }
}

/// An [`io::Error`] paired with the path that triggered it, so failures remain actionable once
/// they bubble up far from the call site that opened the file.
#[derive(Debug, thiserror::Error)]
#[error("{io}: {path}", path = self.path.display())]
pub struct SolcIoError {
    io: io::Error,
    path: PathBuf,
}

impl SolcIoError {
    pub fn new(io: io::Error, path: impl Into<PathBuf>) -> Self {
        Self { io, path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn io(&self) -> &io::Error {
        &self.io
    }
}

impl From<SolcIoError> for io::Error {
    fn from(err: SolcIoError) -> Self {
        err.io
    }
}

pub(crate) trait ResultExt<T> {
    fn map_io_err(self, path: impl AsRef<Path>) -> Result<T, SolcIoError>;
}

impl<T> ResultExt<T> for io::Result<T> {
    fn map_io_err(self, path: impl AsRef<Path>) -> Result<T, SolcIoError> {
        self.map_err(|err| SolcIoError::new(err, path.as_ref()))
    }
}
