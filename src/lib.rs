#![doc = include_str!("../README.md")]
#![warn(rustdoc::all)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

pub mod artifact_output;
pub mod artifacts;
pub mod buildinfo;
pub mod cache;
pub mod cancel;
pub mod compilers;
pub mod config;
pub mod error;
pub mod job;
pub mod remappings;
pub mod report;
pub mod resolver;
pub mod utils;

#[cfg(feature = "project-util")]
pub mod project_util;

pub use artifact_output::ArtifactStore;
pub use artifacts::{CompilerOutput, Source, SolcInput, SolcSettings, Sources};
pub use buildinfo::BuildInfo;
pub use cache::{CacheEntry, CompilerCache};
pub use cancel::CancellationToken;
pub use compilers::Solc;
#[cfg(feature = "svm-solc")]
pub use compilers::{acquire, AcquisitionError, SolcBuild};
pub use config::{ProjectPathsConfig, ProjectPathsConfigBuilder, SolcConfig};
pub use error::{Result, SolcError};
pub use job::{CompilationJob, CompilerConfig, JobCreationError};
pub use remappings::Remapping;
pub use resolver::{
    DependencyGraph, LibraryPackageLookup, PackageLookup, ResolvedFile, Resolver, SourceName,
};

use std::{
    collections::{BTreeMap, BTreeSet},
    path::PathBuf,
};

/// Sequences source resolution, job planning, compilation, and cache/artifact persistence for a
/// single project workspace. Generic over the package-lookup strategy so embedders can plug in
/// their own vendoring scheme; defaults to a conventional `lib/`-directory lookup.
pub struct Project<P: PackageLookup = LibraryPackageLookup> {
    pub paths: ProjectPathsConfig,
    pub solc: SolcConfig,
    /// Compiler configurations the planner is allowed to choose from.
    pub allowed_configs: Vec<CompilerConfig>,
    /// Per-root-file overrides bypassing version selection (job planning Step A).
    pub overrides: BTreeMap<SourceName, CompilerConfig>,
    pub package_lookup: P,
}

impl Project<LibraryPackageLookup> {
    pub fn new(paths: ProjectPathsConfig, solc: SolcConfig, allowed_configs: Vec<CompilerConfig>) -> Self {
        let package_lookup = LibraryPackageLookup { libraries: paths.libraries.clone() };
        Self { paths, solc, allowed_configs, overrides: BTreeMap::new(), package_lookup }
    }
}

#[cfg(feature = "svm-solc")]
impl<P: PackageLookup + Clone> Project<P> {
    /// Runs one full build: resolves `roots`, plans jobs, compiles the survivors in
    /// version-ascending order, and persists artifacts/build-info through `artifact_store`.
    ///
    /// Aborts the whole build — without touching the on-disk cache — on any resolution error,
    /// any planning error, or any compiler diagnostic of severity `error`; partial builds are
    /// not supported. Returns the compiler output of every job actually run (a job the cache
    /// filters out produces no entry).
    pub fn compile<A: ArtifactStore>(
        &self,
        roots: impl IntoIterator<Item = SourceName>,
        artifact_store: &mut A,
        cancel: &CancellationToken,
    ) -> Result<Vec<CompilerOutput>> {
        let roots: BTreeSet<SourceName> = roots.into_iter().collect();
        let span = info_span!("compile", roots = roots.len());
        let _guard = span.enter();

        let resolver = Resolver::new(
            self.paths.root.clone(),
            vec![self.paths.sources.clone()],
            self.package_lookup.clone(),
        );
        let (graph, resolve_errors) = DependencyGraph::build(&resolver, roots.clone());
        if !resolve_errors.is_empty() {
            for err in &resolve_errors {
                error!(%err, "source resolution failed");
            }
            return Err(SolcError::msg(format!(
                "{} source file(s) failed to resolve",
                resolve_errors.len()
            )));
        }

        let mut cache = CompilerCache::read(&self.paths.cache);
        cache.invalidate_missing_artifacts(|name| artifact_store.artifact_exists(name));

        let (jobs, planning_errors) = job::plan_jobs(
            &graph,
            &roots,
            &self.allowed_configs,
            &self.overrides,
            |file, config| match graph.get(file) {
                Some(resolved) => {
                    !cache.has_file_changed(&resolved.absolute_path, &resolved.content_hash, Some(config))
                }
                None => false,
            },
        );
        if !planning_errors.is_empty() {
            for err in &planning_errors {
                error!(%err, "compilation job planning failed");
            }
            return Err(SolcError::Planning(planning_errors.len()));
        }

        debug!(job_count = jobs.len(), "planned compilation jobs");

        // Jobs run strictly sequentially: concurrent solc invocations racing over the same
        // on-disk compiler-version directory is exactly what `compilers::solc::acquire`'s file
        // lock guards against, but nothing guards concurrent cache mutation within one build.
        let mut outputs = Vec::with_capacity(jobs.len());
        for job in &jobs {
            if cancel.is_cancelled() {
                return Err(SolcError::msg("build cancelled"));
            }
            let job_span = info_span!("job", version = %job.config.version);
            let _job_guard = job_span.enter();
            outputs.extend(self.run_job(job, &graph, artifact_store, &mut cache)?);
        }

        let valid_paths: BTreeSet<PathBuf> = graph.files.keys().cloned().collect();
        let dropped = cache.retain_only(&valid_paths);
        let obsolete: Vec<String> = dropped.into_iter().flat_map(|e| e.emitted_artifacts).collect();
        if !obsolete.is_empty() {
            artifact_store.remove_obsolete(&obsolete)?;
        }
        artifact_store.remove_obsolete_build_infos()?;

        // Only flush the cache after every job and every cleanup step has succeeded: an
        // aborted build leaves the cache exactly as it found it, mirroring cancellation's own
        // guarantee and the "no partial builds" rule.
        cache.write(&self.paths.cache)?;
        Ok(outputs)
    }

    fn run_job<A: ArtifactStore>(
        &self,
        job: &CompilationJob,
        graph: &DependencyGraph,
        artifact_store: &mut A,
        cache: &mut CompilerCache,
    ) -> Result<Vec<CompilerOutput>> {
        let build = compilers::acquire(&job.config.version, &self.solc)?;

        let solc = Solc::new(build.compiler_path.clone(), job.config.version.clone())
            .with_base_path(self.paths.root.clone())
            .with_allow_paths(self.paths.allowed_paths())
            .with_include_paths(self.paths.include_paths());

        let mut sources = Sources::new();
        for name in &job.inputs {
            let Some(resolved) = graph.get(name) else {
                return Err(SolcError::msg(format!("{} missing from resolved graph", name.display())));
            };
            sources.insert(name.clone(), Source { content: resolved.content_text.clone() });
        }

        let inputs = SolcInput::build(sources, job.config.settings.clone(), &job.config.version)
            .into_iter()
            .map(|input| input.with_remappings(self.paths.remappings.clone()))
            .collect::<Vec<_>>();

        let mut outputs = Vec::with_capacity(inputs.len());
        let mut emitted: BTreeMap<SourceName, Vec<String>> = BTreeMap::new();

        for input in inputs {
            let output = if build.is_portable {
                compilers::solc::portable::compile_portable(&build.version, &build.compiler_path, &input)?
            } else {
                solc.compile(&input)?
            };
            report_diagnostics(&output);
            if output.has_error() {
                return Err(SolcError::msg(format!(
                    "compilation with solc {} failed with {} error(s)",
                    job.config.version,
                    output.errors.iter().filter(|e| e.is_error()).count()
                )));
            }

            let info = BuildInfo::new(&job.config, &build.long_version, input, output.clone())?;
            let build_info_path = artifact_store.save_build_info(&info)?;

            for file in job.artifact_emitting_files() {
                let Some(contracts) = output.contracts.get(file) else { continue };
                for (name, contract) in contracts {
                    let fqn = format!("{}:{}", file.display(), name);
                    artifact_store.save_artifact(&fqn, contract, &build_info_path)?;
                    emitted.entry(file.clone()).or_default().push(name.clone());
                }
            }

            outputs.push(output);
        }

        for name in &job.inputs {
            let Some(resolved) = graph.get(name) else { continue };
            cache.insert(
                resolved.absolute_path.clone(),
                CacheEntry {
                    last_modification_time: resolved.last_modification_time,
                    content_hash: resolved.content_hash.clone(),
                    source_name: name.clone(),
                    solc_config: job.config.clone(),
                    imports: resolved.imports.clone(),
                    version_pragmas: resolved.version_pragmas.clone(),
                    emitted_artifacts: emitted.remove(name).unwrap_or_default(),
                },
            );
        }

        Ok(outputs)
    }
}

/// Logs non-fatal diagnostics: warnings go to `tracing::warn!`, and a `console.log` usage note
/// (common in test contracts, harmless in production builds) is logged at `info` instead.
/// Error-severity diagnostics are handled by the caller via [`CompilerOutput::has_error`].
fn report_diagnostics(output: &CompilerOutput) {
    for diagnostic in &output.errors {
        if diagnostic.is_error() {
            continue;
        }
        if diagnostic.message.contains("console.log") {
            info!(message = %diagnostic.message, "solidity console.log usage noted");
            continue;
        }
        warn!(message = %diagnostic.message, "solc diagnostic");
    }
}

#[cfg(all(test, feature = "svm-solc"))]
mod tests {
    use super::*;
    use crate::artifacts::Contract;
    use std::{path::Path, sync::Mutex};

    /// An in-memory [`ArtifactStore`] for exercising the orchestrator plumbing without touching
    /// disk or requiring a real solc binary.
    #[derive(Default)]
    struct MemoryArtifactStore {
        artifacts: Mutex<BTreeSet<String>>,
        build_infos_written: usize,
    }

    impl ArtifactStore for MemoryArtifactStore {
        fn save_artifact(
            &mut self,
            name: &str,
            _contract: &Contract,
            _build_info_path: &Path,
        ) -> Result<()> {
            self.artifacts.lock().unwrap().insert(name.to_string());
            Ok(())
        }

        fn save_build_info(&mut self, _info: &BuildInfo) -> Result<PathBuf> {
            self.build_infos_written += 1;
            Ok(PathBuf::from(format!("build-info-{}.json", self.build_infos_written)))
        }

        fn artifact_exists(&self, name: &str) -> bool {
            self.artifacts.lock().unwrap().contains(name)
        }

        fn remove_obsolete(&mut self, names: &[String]) -> Result<()> {
            let mut artifacts = self.artifacts.lock().unwrap();
            for name in names {
                artifacts.remove(name);
            }
            Ok(())
        }

        fn remove_obsolete_build_infos(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn project_new_seeds_package_lookup_from_paths_libraries() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProjectPathsConfig::builder()
            .root(dir.path())
            .lib(dir.path().join("lib/forge-std"))
            .build()
            .unwrap();
        let project = Project::new(paths, SolcConfig::default(), vec![]);
        assert_eq!(project.package_lookup.libraries.len(), 1);
    }

    #[test]
    fn diagnostics_report_does_not_panic_on_empty_output() {
        report_diagnostics(&CompilerOutput::default());
    }

    #[test]
    fn memory_artifact_store_tracks_and_forgets_artifacts() {
        let mut store = MemoryArtifactStore::default();
        store.save_artifact("A.sol:A", &Contract::default(), Path::new("build-info-0.json")).unwrap();
        assert!(store.artifact_exists("A.sol:A"));
        store.remove_obsolete(&["A.sol:A".to_string()]).unwrap();
        assert!(!store.artifact_exists("A.sol:A"));
    }

    #[test]
    fn compile_with_no_roots_and_empty_cache_runs_no_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProjectPathsConfig::builder().root(dir.path()).build().unwrap();
        let project = Project::new(paths, SolcConfig::default(), vec![]);
        let mut store = MemoryArtifactStore::default();
        let outputs = project.compile([], &mut store, &CancellationToken::new()).unwrap();
        assert!(outputs.is_empty());
    }

    #[test]
    fn compile_is_cancellable_before_any_job_runs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("A.sol"), "pragma solidity ^0.8.0;\ncontract A {}\n").unwrap();
        let paths = ProjectPathsConfig::builder().root(dir.path()).build().unwrap();
        let allowed = vec![CompilerConfig {
            version: semver::Version::parse("0.8.19").unwrap(),
            settings: SolcSettings::default(),
        }];
        let project = Project::new(paths, SolcConfig::default(), allowed);
        let mut store = MemoryArtifactStore::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = project.compile([PathBuf::from("A.sol")], &mut store, &cancel);
        assert!(result.is_err());
    }
}
