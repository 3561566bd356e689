//! Build-info records: the artifact emitter writes one of these per completed
//! [`crate::job::CompilationJob`], pairing the exact Standard JSON sent to solc with the exact
//! output it returned, so downstream tooling can reconstruct a job without re-running the
//! compiler. The format and id scheme match what hardhat/ethers-based tooling already expects.

use crate::{
    artifacts::{CompilerOutput, SolcInput},
    error::Result,
    job::CompilerConfig,
    utils,
};
use md5::Digest;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ETHERS_FORMAT_VERSION: &str = "ethers-rs-sol-build-info-1";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub id: String,
    #[serde(rename = "_format")]
    pub format: String,
    pub solc_version: Version,
    pub solc_long_version: Version,
    pub input: SolcInput,
    pub output: CompilerOutput,
}

impl BuildInfo {
    /// Deserializes a `BuildInfo` previously written by [`BuildInfo::new`].
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        utils::read_json_file(path)
    }

    /// Builds a new record for one completed job. `long_version` is the full version string the
    /// binary itself reported (`config.version` is the 3-part semver the planner worked with).
    pub fn new(
        config: &CompilerConfig,
        long_version: &Version,
        input: SolcInput,
        output: CompilerOutput,
    ) -> Result<Self> {
        Ok(Self {
            id: build_info_id(config, &input)?,
            format: ETHERS_FORMAT_VERSION.to_string(),
            solc_version: config.version.clone(),
            solc_long_version: long_version.clone(),
            input,
            output,
        })
    }
}

/// Hashes `{_format, solcVersion, solcLongVersion, input}` into a stable id. Not the same as
/// hashing the serialized `BuildInfo` itself, but cheaper and equally stable since `input` fully
/// determines `output` for a deterministic compiler.
fn build_info_id(config: &CompilerConfig, input: &SolcInput) -> Result<String> {
    let mut hasher = md5::Md5::new();
    hasher.update(ETHERS_FORMAT_VERSION);
    let solc_short =
        format!("{}.{}.{}", config.version.major, config.version.minor, config.version.patch);
    hasher.update(&solc_short);
    hasher.update(config.version.to_string());
    hasher.update(serde_json::to_string(input)?);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::SolcSettings;
    use std::collections::BTreeMap;

    #[test]
    fn round_trips_through_json() {
        let config = CompilerConfig {
            version: Version::parse("0.8.19").unwrap(),
            settings: SolcSettings::default(),
        };
        let input = SolcInput::new(BTreeMap::new(), SolcSettings::default());
        let output = CompilerOutput::default();
        let info = BuildInfo::new(&config, &config.version, input, output).unwrap();

        let serialized = serde_json::to_string(&info).unwrap();
        let parsed: BuildInfo = serde_json::from_str(&serialized).unwrap();
        assert_eq!(parsed.id, info.id);
        assert_eq!(parsed.format, ETHERS_FORMAT_VERSION);
    }

    #[test]
    fn id_is_stable_for_equal_inputs() {
        let config = CompilerConfig {
            version: Version::parse("0.8.19").unwrap(),
            settings: SolcSettings::default(),
        };
        let input_a = SolcInput::new(BTreeMap::new(), SolcSettings::default());
        let input_b = SolcInput::new(BTreeMap::new(), SolcSettings::default());
        let a = build_info_id(&config, &input_a).unwrap();
        let b = build_info_id(&config, &input_b).unwrap();
        assert_eq!(a, b);
    }
}
