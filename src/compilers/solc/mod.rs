//! The native `solc` binary: version probing and Standard JSON invocation over stdin/stdout.
//! Acquiring a binary in the first place is [`acquire`]; running the portable WASM/JS fallback
//! when the native binary is unusable is [`portable`].

#[cfg(feature = "svm-solc")]
pub mod acquire;
#[cfg(feature = "svm-solc")]
pub mod portable;

#[cfg(feature = "svm-solc")]
pub use acquire::{acquire, AcquisitionError, SolcBuild};

use crate::{
    artifacts::{CompilerOutput, SolcInput},
    error::{Result, SolcError},
};
use itertools::Itertools;
use semver::{Version, VersionReq};
use std::{
    collections::BTreeSet,
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
    str::FromStr,
    time::Duration,
};

/// `--base-path` was introduced in 0.6.9.
pub static SUPPORTS_BASE_PATH: once_cell::sync::Lazy<VersionReq> =
    once_cell::sync::Lazy::new(|| VersionReq::parse(">=0.6.9").unwrap());

/// `--include-path` was introduced in 0.8.8.
pub static SUPPORTS_INCLUDE_PATH: once_cell::sync::Lazy<VersionReq> =
    once_cell::sync::Lazy::new(|| VersionReq::parse(">=0.8.8").unwrap());

/// A located, runnable `solc` binary.
#[derive(Debug, Clone, Eq, PartialEq, PartialOrd, Ord)]
pub struct Solc {
    pub path: PathBuf,
    pub version: Version,
    pub base_path: Option<PathBuf>,
    pub allow_paths: BTreeSet<PathBuf>,
    pub include_paths: BTreeSet<PathBuf>,
}

impl Solc {
    pub fn new(path: impl Into<PathBuf>, version: Version) -> Self {
        Self {
            path: path.into(),
            version,
            base_path: None,
            allow_paths: BTreeSet::new(),
            include_paths: BTreeSet::new(),
        }
    }

    pub fn with_base_path(mut self, base_path: PathBuf) -> Self {
        self.base_path = Some(base_path);
        self
    }

    pub fn with_allow_paths(mut self, allow_paths: BTreeSet<PathBuf>) -> Self {
        self.allow_paths = allow_paths;
        self
    }

    pub fn with_include_paths(mut self, include_paths: BTreeSet<PathBuf>) -> Self {
        self.include_paths = include_paths;
        self
    }

    /// Invokes `solc --version` and parses the trailing version line, with a timeout. Used both
    /// to discover a fresh binary's version and as the acquisition liveness probe.
    pub fn probe_version(path: &Path, timeout: Duration) -> Result<Version> {
        let mut child = Command::new(path)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SolcError::io(e, path))?;

        let start = std::time::Instant::now();
        loop {
            if let Some(status) = child.try_wait().map_err(|e| SolcError::io(e, path))? {
                let output = Output {
                    status,
                    stdout: read_all(child.stdout.take()),
                    stderr: read_all(child.stderr.take()),
                };
                return version_from_output(output);
            }
            if start.elapsed() > timeout {
                let _ = child.kill();
                return Err(SolcError::msg(format!(
                    "{} did not respond to --version within {timeout:?}",
                    path.display()
                )));
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    /// Builds the `solc --standard-json` command line for this binary's version, including
    /// `--base-path`/`--include-path`/`--allow-paths` only where the version supports them.
    fn configure_cmd(&self) -> Command {
        let mut cmd = Command::new(&self.path);
        cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());

        if !self.allow_paths.is_empty() {
            cmd.arg("--allow-paths");
            cmd.arg(self.allow_paths.iter().map(|p| p.display()).join(","));
        }

        if let Some(base_path) = &self.base_path {
            if SUPPORTS_BASE_PATH.matches(&self.version) {
                if SUPPORTS_INCLUDE_PATH.matches(&self.version) {
                    for path in self.include_paths.iter().filter(|p| p.as_path() != base_path) {
                        cmd.arg("--include-path").arg(path);
                    }
                }
                cmd.arg("--base-path").arg(base_path);
            }
            cmd.current_dir(base_path);
        }

        cmd.arg("--standard-json");
        cmd
    }

    /// Runs the compiler over `input`, feeding it on stdin and parsing Standard JSON from stdout.
    /// A malformed response surfaces as [`SolcError::CompilerProtocol`].
    pub fn compile(&self, input: &SolcInput) -> Result<CompilerOutput> {
        let mut cmd = self.configure_cmd();
        debug!(?cmd, version = %self.version, "spawning solc");

        let mut child = cmd.spawn().map_err(|e| SolcError::io(e, &self.path))?;
        let stdin = child.stdin.take().expect("stdin piped");
        let payload = serde_json::to_vec(input)?;
        // Streaming write with a bounded buffer rather than collecting the whole response before
        // parsing; solc output for large projects can run into the tens of megabytes.
        {
            let mut writer = std::io::BufWriter::new(stdin);
            writer.write_all(&payload).map_err(|e| SolcError::io(e, &self.path))?;
        }

        let output = child.wait_with_output().map_err(|e| SolcError::io(e, &self.path))?;
        if !output.status.success() {
            return Err(SolcError::solc_output(Some(self.version.clone()), &output));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| SolcError::CompilerProtocol(e.to_string()))
    }
}

fn read_all(stream: Option<impl std::io::Read>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut s) = stream {
        let _ = std::io::Read::read_to_end(&mut s, &mut buf);
    }
    buf
}

fn version_from_output(output: Output) -> Result<Version> {
    if !output.status.success() {
        return Err(SolcError::solc_output(None, &output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .last()
        .ok_or_else(|| SolcError::msg("version not found in solc --version output"))?;
    // semver rejects the `+` g++ build-metadata marker some solc builds emit.
    let cleaned = line.trim_start_matches("Version: ").replace(".g++", ".gcc");
    Ok(Version::from_str(cleaned.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_version_line() {
        let output = Output {
            status: exit_success(),
            stdout: b"solc, the solidity compiler commandline interface\nVersion: 0.8.19+commit.7dd6d404.Linux.g++\n".to_vec(),
            stderr: Vec::new(),
        };
        let version = version_from_output(output).unwrap();
        assert_eq!(version, Version::parse("0.8.19+commit.7dd6d404.Linux.gcc").unwrap());
    }

    #[cfg(unix)]
    fn exit_success() -> std::process::ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        std::process::ExitStatus::from_raw(0)
    }

    #[cfg(not(unix))]
    fn exit_success() -> std::process::ExitStatus {
        std::process::Command::new("cmd").arg("/C").arg("exit 0").status().unwrap()
    }
}
