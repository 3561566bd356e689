//! End-to-end builds against a real, network-installed `solc`. Exercises the testable properties
//! named for the orchestrator: a clean build produces artifacts, a no-op rebuild touches no
//! compiler, and deleting an artifact forces just the owning file to recompile.

use foundry_compilers::{
    artifacts::Contract, buildinfo::BuildInfo, project_util::TempProject, ArtifactStore,
    CancellationToken, CompilerConfig, Project, Result, SolcConfig,
};
use semver::Version;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// A minimal on-disk [`ArtifactStore`]: one JSON file per fully qualified contract name under
/// `out/`, one build-info file per compiled input under `out/build-info/`.
struct DiskArtifactStore {
    artifacts_dir: PathBuf,
    build_infos_dir: PathBuf,
    next_build_info: usize,
}

impl DiskArtifactStore {
    fn new(artifacts_dir: PathBuf, build_infos_dir: PathBuf) -> Self {
        std::fs::create_dir_all(&artifacts_dir).unwrap();
        std::fs::create_dir_all(&build_infos_dir).unwrap();
        Self { artifacts_dir, build_infos_dir, next_build_info: 0 }
    }

    fn artifact_path(&self, fully_qualified_name: &str) -> PathBuf {
        let sanitized = fully_qualified_name.replace(['/', ':'], "_");
        self.artifacts_dir.join(format!("{sanitized}.json"))
    }
}

impl ArtifactStore for DiskArtifactStore {
    fn save_artifact(
        &mut self,
        fully_qualified_name: &str,
        contract: &Contract,
        _build_info_path: &Path,
    ) -> Result<()> {
        let path = self.artifact_path(fully_qualified_name);
        let json = serde_json::to_vec_pretty(contract)?;
        std::fs::write(path, json).unwrap();
        Ok(())
    }

    fn save_build_info(&mut self, info: &BuildInfo) -> Result<PathBuf> {
        self.next_build_info += 1;
        let path = self.build_infos_dir.join(format!("{}.json", self.next_build_info));
        let json = serde_json::to_vec_pretty(info)?;
        std::fs::write(&path, json).unwrap();
        Ok(path)
    }

    fn artifact_exists(&self, fully_qualified_name: &str) -> bool {
        self.artifact_path(fully_qualified_name).is_file()
    }

    fn remove_obsolete(&mut self, fully_qualified_names: &[String]) -> Result<()> {
        for name in fully_qualified_names {
            let _ = std::fs::remove_file(self.artifact_path(name));
        }
        Ok(())
    }

    fn remove_obsolete_build_infos(&mut self) -> Result<()> {
        Ok(())
    }
}

fn allowed_configs() -> Vec<CompilerConfig> {
    vec![CompilerConfig { version: Version::new(0, 8, 19), settings: Default::default() }]
}

/// Installs a `tracing` subscriber controlled by `RUST_LOG`, so a developer chasing down a
/// flaky network-dependent test can rerun it with `RUST_LOG=debug` and see acquisition/compile
/// spans instead of a bare pass/fail.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[test]
fn clean_build_emits_an_artifact_for_the_root_contract() {
    init_tracing();
    let project = TempProject::new().unwrap();
    project
        .add_source("Counter", "pragma solidity ^0.8.0;\ncontract Counter { uint256 public x; }\n")
        .unwrap();

    let orchestrator = Project::new(project.paths.clone(), SolcConfig::default(), allowed_configs());
    let mut store = DiskArtifactStore::new(
        project.paths.artifacts.clone(),
        project.paths.build_infos.clone(),
    );

    let outputs = orchestrator
        .compile([PathBuf::from("Counter.sol")], &mut store, &CancellationToken::new())
        .unwrap();

    assert_eq!(outputs.len(), 1);
    assert!(!outputs[0].has_error());
    assert!(store.artifact_exists("Counter.sol:Counter"));
}

#[test]
fn unchanged_rebuild_produces_no_jobs() {
    let project = TempProject::new().unwrap();
    project
        .add_source("Counter", "pragma solidity ^0.8.0;\ncontract Counter { uint256 public x; }\n")
        .unwrap();

    let orchestrator = Project::new(project.paths.clone(), SolcConfig::default(), allowed_configs());
    let mut store = DiskArtifactStore::new(
        project.paths.artifacts.clone(),
        project.paths.build_infos.clone(),
    );

    orchestrator
        .compile([PathBuf::from("Counter.sol")], &mut store, &CancellationToken::new())
        .unwrap();

    let second_run = orchestrator
        .compile([PathBuf::from("Counter.sol")], &mut store, &CancellationToken::new())
        .unwrap();

    assert!(second_run.is_empty(), "cache hit should skip compiling entirely");
}

#[test]
fn deleting_one_artifact_only_recompiles_its_owning_file() {
    let project = TempProject::new().unwrap();
    project
        .add_source("A", "pragma solidity ^0.8.0;\ncontract A { uint256 public x; }\n")
        .unwrap();
    project
        .add_source("B", "pragma solidity ^0.8.0;\ncontract B { uint256 public y; }\n")
        .unwrap();

    let orchestrator = Project::new(project.paths.clone(), SolcConfig::default(), allowed_configs());
    let mut store = DiskArtifactStore::new(
        project.paths.artifacts.clone(),
        project.paths.build_infos.clone(),
    );

    let roots: Vec<PathBuf> = vec!["A.sol".into(), "B.sol".into()];
    orchestrator.compile(roots.clone(), &mut store, &CancellationToken::new()).unwrap();

    std::fs::remove_file(store.artifact_path("A.sol:A")).unwrap();

    let rebuild = orchestrator.compile(roots, &mut store, &CancellationToken::new()).unwrap();
    assert_eq!(rebuild.len(), 1);
    let contracts = &rebuild[0].contracts;
    assert!(contracts.contains_key(&PathBuf::from("A.sol")));
    assert!(!contracts.contains_key(&PathBuf::from("B.sol")));
}

#[test]
fn directly_incompatible_versions_abort_before_acquiring_a_compiler() {
    let project = TempProject::new().unwrap();
    project.add_source("A", "pragma solidity ^0.8.0;\nimport \"./B.sol\";\n").unwrap();
    project.add_source("B", "pragma solidity ^0.7.0;\n").unwrap();

    let orchestrator = Project::new(project.paths.clone(), SolcConfig::default(), allowed_configs());
    let mut store = DiskArtifactStore::new(
        project.paths.artifacts.clone(),
        project.paths.build_infos.clone(),
    );

    let result =
        orchestrator.compile([PathBuf::from("A.sol")], &mut store, &CancellationToken::new());
    assert!(result.is_err());
}

#[test]
fn per_root_override_pins_a_compiler_version() {
    let project = TempProject::new().unwrap();
    project.add_source("Legacy", "pragma solidity ^0.7.0;\ncontract Legacy {}\n").unwrap();

    let mut overrides = BTreeMap::new();
    overrides.insert(
        PathBuf::from("Legacy.sol"),
        CompilerConfig { version: Version::new(0, 7, 6), settings: Default::default() },
    );

    let mut orchestrator =
        Project::new(project.paths.clone(), SolcConfig::default(), vec![allowed_configs()[0].clone()]);
    orchestrator.overrides = overrides;

    let mut store = DiskArtifactStore::new(
        project.paths.artifacts.clone(),
        project.paths.build_infos.clone(),
    );

    let outputs = orchestrator
        .compile([PathBuf::from("Legacy.sol")], &mut store, &CancellationToken::new())
        .unwrap();
    assert_eq!(outputs.len(), 1);
    assert!(!outputs[0].has_error());
}
