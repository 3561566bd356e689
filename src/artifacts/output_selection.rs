//! The Standard JSON `settings.outputSelection` map: `{ file: { contract: [selectors] } }`,
//! with `*` wildcards for file and contract name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputSelection(pub BTreeMap<String, BTreeMap<String, Vec<String>>>);

impl OutputSelection {
    /// The selectors every job needs regardless of caller-requested output: ABI and bytecode are
    /// what `ArtifactStore` downstream consumers almost universally expect.
    pub fn default_file_output_selection() -> Vec<String> {
        vec![
            "abi".to_string(),
            "evm.bytecode.object".to_string(),
            "evm.deployedBytecode.object".to_string(),
            "metadata".to_string(),
        ]
    }

    pub fn new_all_selection() -> Self {
        let mut contracts = BTreeMap::new();
        contracts.insert("*".to_string(), Self::default_file_output_selection());
        let mut files = BTreeMap::new();
        files.insert("*".to_string(), contracts);
        Self(files)
    }

    pub fn insert(&mut self, file: &str, contract: &str, selector: &str) {
        let contracts = self.0.entry(file.to_string()).or_default();
        let selectors = contracts.entry(contract.to_string()).or_default();
        if !selectors.iter().any(|s| s == selector) {
            selectors.push(selector.to_string());
        }
    }

    /// Returns `true` if every selector this selection asks for is also asked for by `other`,
    /// i.e. artifacts compiled for `other` would satisfy a request for `self`.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        for (file, contracts) in &self.0 {
            let other_contracts = match other.0.get(file).or_else(|| other.0.get("*")) {
                Some(c) => c,
                None => return false,
            };
            for (contract, selectors) in contracts {
                let other_selectors = match other_contracts
                    .get(contract)
                    .or_else(|| other_contracts.get("*"))
                {
                    Some(s) => s,
                    None => return false,
                };
                if !selectors.iter().all(|s| other_selectors.iter().any(|o| o == s)) {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subset_of_wildcard_all() {
        let mut narrow = OutputSelection::default();
        narrow.insert("A.sol", "A", "abi");
        let wide = OutputSelection::new_all_selection();
        assert!(narrow.is_subset_of(&wide));
    }

    #[test]
    fn not_subset_when_selector_missing() {
        let mut narrow = OutputSelection::default();
        narrow.insert("A.sol", "A", "evm.bytecode.object");
        let mut other = OutputSelection::default();
        other.insert("A.sol", "A", "abi");
        assert!(!narrow.is_subset_of(&other));
    }
}
