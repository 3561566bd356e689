//! Path, hashing, and JSON helpers shared across the resolver, cache, and acquisition layers.

use crate::error::{Result, ResultExt, SolcError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Component, Path, PathBuf},
};

/// Matches Solidity/Yul import statements, capturing the quoted path in one of four shapes:
/// `import "x"`, `import {A} from "x"`, `import * as A from "x"`, `import "x" as A`.
pub static RE_SOL_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?:import\s+"(?P<p1>[^"]+)"\s*(?:as\s+[^;]+)?;)|(?:import\s+'(?P<p2>[^']+)'\s*(?:as\s+[^;]+)?;)|(?:import\s+(?:\*|\{[^}]*\})\s+as\s+[^\s]+\s+from\s+"(?P<p3>[^"]+)";)|(?:import\s+(?:\*|\{[^}]*\})\s+as\s+[^\s]+\s+from\s+'(?P<p4>[^']+)';)|(?:import\s+\{[^}]*\}\s+from\s+"(?P<p5>[^"]+)";)|(?:import\s+\{[^}]*\}\s+from\s+'(?P<p6>[^']+)';)"#,
    )
    .unwrap()
});

/// Matches the solidity version pragma, e.g. `pragma solidity ^0.8.0;`.
pub static RE_SOL_PRAGMA_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"pragma\s+solidity\s+(?P<version>[^;]+);").unwrap());

/// Strips line (`//`) and block (`/* */`) comments and the contents of string literals from
/// Solidity source text, so regex-based extraction below does not trip over commented-out or
/// quoted import/pragma-looking text. This is the full extent of "parsing" this crate performs.
pub fn strip_comments_and_strings(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        match c {
            '/' if matches!(chars.peek(), Some((_, '/'))) => {
                chars.next();
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                let mut prev = ' ';
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            '"' | '\'' => {
                let quote = c;
                out.push(' ');
                for (_, c) in chars.by_ref() {
                    if c == '\\' {
                        chars.next();
                        continue;
                    }
                    if c == quote {
                        break;
                    }
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Extracts the raw import path strings from Solidity/Yul source text.
pub fn find_import_paths(content: &str) -> Vec<String> {
    let cleaned = strip_comments_and_strings(content);
    RE_SOL_IMPORT
        .captures_iter(&cleaned)
        .filter_map(|cap| {
            ["p1", "p2", "p3", "p4", "p5", "p6"]
                .iter()
                .find_map(|name| cap.name(name))
                .map(|m| m.as_str().to_owned())
        })
        .collect()
}

/// Extracts the version pragma requirement strings from Solidity source text, if any.
pub fn find_version_pragmas(content: &str) -> Vec<String> {
    let cleaned = strip_comments_and_strings(content);
    RE_SOL_PRAGMA_VERSION
        .captures_iter(&cleaned)
        .filter_map(|cap| cap.name("version").map(|m| m.as_str().trim().to_owned()))
        .collect()
}

/// Normalizes a solidity version pragma string (e.g. `^0.8.0 <0.9.0`) into a [`semver::VersionReq`].
///
/// `VersionReq::parse` requires comma-separated comparators and rejects a bare version as
/// "exact"; solidity pragmas separate comparators with whitespace and treat a bare version as
/// exact too, so both quirks are patched here.
pub fn parse_version_req(version: &str) -> std::result::Result<semver::VersionReq, semver::Error> {
    let version = version.replace(' ', ",");
    if version.trim().is_empty() {
        // `semver::Error` has no public constructor; force one by parsing a string that can
        // never be a valid requirement, rather than indexing into an empty slice below.
        return semver::VersionReq::parse("!");
    }
    let exact = !matches!(&version[..1], "*" | "^" | "=" | ">" | "<" | "~");
    let mut req = semver::VersionReq::parse(&version)?;
    if exact {
        req.comparators[0].op = semver::Op::Exact;
    }
    Ok(req)
}

/// Converts an arbitrary filesystem path into a forward-slash source name relative to `base`.
///
/// Falls back to the path's own string form (forward-slashed) if it isn't actually under `base`.
pub fn source_name(path: &Path, base: &Path) -> PathBuf {
    let rel = path.strip_prefix(base).unwrap_or(path);
    PathBuf::from(path_slash::PathExt::to_slash_lossy(rel).as_ref())
}

/// Lexically joins `import_path` (as written in an import statement) against the directory of
/// `importer`, resolving `.`/`..` components without touching the filesystem.
///
/// Returns `None` if the result would escape above the root (`..` past the first component),
/// which the resolver reports as an [`SolcError::IllegalImport`].
pub fn rebase_import(importer_dir: &Path, import_path: &str) -> Option<PathBuf> {
    let joined = importer_dir.join(import_path);
    let mut out: Vec<Component> = Vec::new();
    for comp in joined.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.pop() {
                Some(Component::Normal(_)) => {}
                Some(popped) => {
                    out.push(popped);
                    return None;
                }
                None => return None,
            },
            other => out.push(other),
        }
    }
    Some(out.into_iter().collect())
}

/// A stable content digest (keccak256) used to key cache entries and build-info ids.
pub fn content_hash(content: &str) -> String {
    use tiny_keccak::{Hasher, Keccak};
    let mut hasher = Keccak::v256();
    hasher.update(content.as_bytes());
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    hex::encode(out)
}

/// Reads and deserializes a JSON file, wrapping IO failures with the offending path.
pub fn read_json_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_io_err(path)?;
    serde_json::from_str(&content).map_err(|err| {
        SolcError::msg(format!("failed to deserialize {}: {err}", path.display()))
    })
}

/// Serializes `value` as pretty JSON and writes it atomically: to a sibling temp file, then
/// renamed over the destination, so a crash mid-write never leaves a truncated cache file.
pub fn write_json_file<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        create_parent_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    {
        let file = fs::File::create(&tmp_path).map_io_err(&tmp_path)?;
        let mut writer = BufWriter::with_capacity(128 * 1024, file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush().map_io_err(&tmp_path)?;
    }
    fs::rename(&tmp_path, path).map_io_err(path)?;
    Ok(())
}

/// Creates `dir` and all of its ancestors, tolerating the case where it already exists.
pub fn create_parent_dir_all(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_io_err(dir)?;
    Ok(())
}

/// Canonicalizes a path, falling back to lexical cleanup on platforms/paths where
/// `fs::canonicalize` balks (e.g. the path does not exist yet). Uses `dunce` so canonicalized
/// Windows paths don't gain a `\\?\` prefix that would break source-name comparisons.
pub fn canonicalize(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    dunce::canonicalize(path).map_io_err(path).map_err(Into::into)
}

/// A small wrapper that lets synchronous code blocking-call into an async function (used by
/// the solc version manager to drive `svm::install`, which is async upstream). Reuses the
/// current tokio runtime's handle if called from within one, otherwise spins up a throwaway
/// single-purpose runtime.
#[cfg(not(target_arch = "wasm32"))]
pub enum RuntimeOrHandle {
    Runtime(tokio::runtime::Runtime),
    Handle(tokio::runtime::Handle),
}

#[cfg(not(target_arch = "wasm32"))]
impl RuntimeOrHandle {
    pub fn new() -> Self {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => Self::Handle(handle),
            Err(_) => Self::Runtime(
                tokio::runtime::Runtime::new().expect("failed to start tokio runtime"),
            ),
        }
    }

    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        match self {
            Self::Runtime(runtime) => runtime.block_on(future),
            Self::Handle(handle) => tokio::task::block_in_place(|| handle.block_on(future)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments_before_matching() {
        let content = r#"
// import "ignored.sol";
/* import "also_ignored.sol"; */
import "real.sol";
import {A} from "real2.sol";
"#;
        let imports = find_import_paths(content);
        assert_eq!(imports, vec!["real.sol".to_string(), "real2.sol".to_string()]);
    }

    #[test]
    fn captures_version_pragma() {
        let content = "pragma solidity ^0.8.0;\ncontract C {}";
        assert_eq!(find_version_pragmas(content), vec!["^0.8.0".to_string()]);
    }

    #[test]
    fn version_req_handles_bare_version() {
        let req = parse_version_req("0.8.19").unwrap();
        assert!(req.matches(&semver::Version::new(0, 8, 19)));
        assert!(!req.matches(&semver::Version::new(0, 8, 20)));
    }

    #[test]
    fn version_req_handles_whitespace_separated_range() {
        let req = parse_version_req(">=0.8.0 <0.9.0").unwrap();
        assert!(req.matches(&semver::Version::new(0, 8, 19)));
        assert!(!req.matches(&semver::Version::new(0, 9, 0)));
    }

    #[test]
    fn version_req_rejects_blank_pragma_instead_of_panicking() {
        assert!(parse_version_req("").is_err());
        assert!(parse_version_req("   ").is_err());
    }

    #[test]
    fn rebase_rejects_escape_above_root() {
        assert_eq!(rebase_import(Path::new("contracts"), "../../etc/passwd"), None);
    }

    #[test]
    fn rebase_normalizes_dot_segments() {
        assert_eq!(
            rebase_import(Path::new("contracts/sub"), "../Foo.sol"),
            Some(PathBuf::from("contracts/Foo.sol"))
        );
    }
}
