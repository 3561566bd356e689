//! The subset of the Solidity Standard JSON input/output schema this crate needs: enough to
//! build a compiler input, and enough to read back contracts, diagnostics and source ids.
//!
//! This deliberately stops well short of the full artifact file format downstream tooling
//! eventually writes to disk — that format is treated as an external collaborator (see
//! [`crate::artifact_output::ArtifactStore`]) and is out of scope here.

pub mod error;
pub mod output_selection;
pub mod serde_helpers;

pub use error::{Error, Severity};

use crate::remappings::Remapping;
use alloy_json_abi::JsonAbi;
use output_selection::OutputSelection;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// The raw text of a single source file, as fed to the compiler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub content: std::sync::Arc<String>,
}

impl Source {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: std::sync::Arc::new(content.into()) }
    }
}

/// Maps a [`crate::resolver::SourceName`]-shaped path to its content.
pub type Sources = BTreeMap<PathBuf, Source>;

/// A per-file entry in the Standard JSON output's `sources` map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ast: Option<serde_json::Value>,
}

/// A single compiled contract's relevant outputs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Contract {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<JsonAbi>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(default)]
    pub evm: Evm,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Evm {
    #[serde(default)]
    pub bytecode: Bytecode,
    #[serde(default, rename = "deployedBytecode")]
    pub deployed_bytecode: Bytecode,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Bytecode {
    #[serde(default)]
    pub object: String,
}

/// Maps a source file's path to its contracts, keyed by contract name.
pub type FileToContractsMap<T> = BTreeMap<PathBuf, BTreeMap<String, T>>;

/// The Standard JSON output document: diagnostics, compiled contracts, and per-source ids.
///
/// The planner guarantees every import of a `sources` entry in the corresponding input is itself
/// present in that input's `sources` map, so this is the complete closure the compiler needs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CompilerOutput {
    #[serde(default)]
    pub errors: Vec<Error>,
    #[serde(default)]
    pub contracts: FileToContractsMap<Contract>,
    #[serde(default)]
    pub sources: BTreeMap<PathBuf, SourceFile>,
}

impl CompilerOutput {
    /// `true` if any diagnostic has severity `error` — this fails the whole build.
    pub fn has_error(&self) -> bool {
        self.errors.iter().any(Error::is_error)
    }

    pub fn has_warning(&self) -> bool {
        self.errors.iter().any(Error::is_warning)
    }
}

/// The Standard JSON input document: `{ language, sources, settings }`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolcInput {
    pub language: String,
    pub sources: Sources,
    pub settings: SolcSettings,
}

impl SolcInput {
    pub fn new(sources: Sources, settings: SolcSettings) -> Self {
        let is_yul = sources.keys().all(|p| p.extension().map_or(false, |e| e == "yul"));
        Self { language: if is_yul { "Yul" } else { "Solidity" }.to_string(), sources, settings }
    }

    /// Splits mixed sources into one Solidity input and (if any yul files are present) one Yul
    /// input, matching the Standard JSON restriction that a single input has a single language.
    pub fn build(sources: Sources, settings: SolcSettings, version: &Version) -> Vec<Self> {
        let mut settings = settings;
        settings.sanitize(version);

        let mut solidity = BTreeMap::new();
        let mut yul = BTreeMap::new();
        for (path, source) in sources {
            if path.extension().map_or(false, |e| e == "yul") {
                yul.insert(path, source);
            } else {
                solidity.insert(path, source);
            }
        }

        let mut inputs = Vec::new();
        if !solidity.is_empty() {
            inputs.push(Self {
                language: "Solidity".to_string(),
                sources: solidity,
                settings: settings.clone(),
            });
        }
        if !yul.is_empty() {
            inputs.push(Self { language: "Yul".to_string(), sources: yul, settings });
        }
        inputs
    }

    pub fn with_remappings(mut self, remappings: Vec<Remapping>) -> Self {
        self.settings.remappings = remappings;
        self
    }

    /// Rewrites every source path to be relative to `base`, so the compiler sees stable,
    /// machine-independent source names in its diagnostics and metadata.
    pub fn strip_prefix(&mut self, base: &Path) {
        self.sources = std::mem::take(&mut self.sources)
            .into_iter()
            .map(|(path, source)| (path.strip_prefix(base).map(Path::to_path_buf).unwrap_or(path), source))
            .collect();
    }
}

/// Compiler settings forwarded verbatim (mostly) to solc. Equality on this type is what the
/// incremental cache compares to decide whether a previously compiled file can be reused.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolcSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_after: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remappings: Vec<Remapping>,
    #[serde(default)]
    pub optimizer: Optimizer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_checker: Option<ModelCheckerSettings>,
    #[serde(default)]
    pub metadata: Option<MetadataSettings>,
    pub output_selection: OutputSelection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm_version: Option<EvmVersion>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub via_ir: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebuggingSettings>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub libraries: BTreeMap<PathBuf, BTreeMap<String, String>>,
}

impl SolcSettings {
    /// Drops settings fields the target `version` doesn't understand, rather than erroring —
    /// mirrors the upstream behavior of silently degrading rather than failing old compilers.
    pub fn sanitize(&mut self, version: &Version) {
        if let Some(evm_version) = self.evm_version {
            self.evm_version = evm_version.normalize_version_solc(version);
        }
        if *version < Version::new(0, 8, 13) {
            self.via_ir = false;
        }
        if *version < Version::new(0, 8, 18) {
            self.model_checker = None;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvmVersion {
    Homestead,
    TangerineWhistle,
    SpuriousDragon,
    Byzantium,
    Constantinople,
    Petersburg,
    Istanbul,
    Berlin,
    London,
    Paris,
    Shanghai,
    Cancun,
}

impl EvmVersion {
    /// Clamps to the newest evm version the given solc actually supports.
    pub fn normalize_version_solc(self, version: &Version) -> Option<Self> {
        let newest_supported = if *version >= Version::new(0, 8, 24) {
            Self::Cancun
        } else if *version >= Version::new(0, 8, 20) {
            Self::Shanghai
        } else if *version >= Version::new(0, 8, 18) {
            Self::Paris
        } else {
            Self::London
        };
        Some(self.min(newest_supported))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Optimizer {
    pub enabled: bool,
    pub runs: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCheckerSettings {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contracts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytecode_hash: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebuggingSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert_strings: Option<String>,
}
