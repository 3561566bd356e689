//! Lexical extraction of imports and the version pragma from Solidity/Yul source text.
//!
//! This is deliberately *not* a parser: no AST is built, no semantic analysis is performed.
//! Comments and string literal bodies are stripped first so regexes don't misfire on
//! commented-out or quoted text that merely looks like an import or pragma.

use crate::utils;
use std::path::Path;

/// The data this crate needs out of a single source file, extracted lexically. The combined
/// version requirement across `version_pragmas` is computed lazily by
/// [`crate::resolver::ResolvedFile::version_req`] rather than stored here, since not every
/// caller of [`SolData::parse`] needs it.
#[derive(Clone, Debug, Default)]
pub struct SolData {
    /// Raw import path strings as written in the source (not yet canonicalized).
    pub imports: Vec<String>,
    /// Raw pragma strings, e.g. `^0.8.0`, `>=0.8.0 <0.9.0`.
    pub version_pragmas: Vec<String>,
    pub is_yul: bool,
}

impl SolData {
    pub fn parse(content: &str, file: &Path) -> Self {
        let is_yul = file.extension().map_or(false, |ext| ext == "yul");
        let imports = utils::find_import_paths(content);
        let version_pragmas = utils::find_version_pragmas(content);
        Self { imports, version_pragmas, is_yul }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn combines_multiple_pragmas() {
        let content = "pragma solidity >=0.8.0;\npragma solidity <0.9.0;\ncontract C {}";
        let data = SolData::parse(content, Path::new("A.sol"));
        assert_eq!(data.version_pragmas.len(), 2);
    }

    #[test]
    fn detects_yul_by_extension() {
        let data = SolData::parse("{}", Path::new("A.yul"));
        assert!(data.is_yul);
    }
}
