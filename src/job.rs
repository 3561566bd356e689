//! Compilation-job planning: choosing a compiler version per file, grouping files into
//! jobs, merging compatible jobs, filtering out jobs the cache says are unnecessary, and
//! ordering the survivors deterministically.

use crate::{
    artifacts::SolcSettings,
    resolver::{DependencyGraph, SourceName},
};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// `version` + `settings` identify a compiler configuration. Two jobs merge only when their
/// configs are equal by this definition — settings are never collapsed into version alone,
/// so incompatible settings never silently collide into one job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    pub version: Version,
    pub settings: SolcSettings,
}

/// A group of files to hand to the compiler in one invocation.
#[derive(Clone, Debug)]
pub struct CompilationJob {
    pub config: CompilerConfig,
    pub inputs: BTreeSet<SourceName>,
    artifact_emitting: BTreeSet<SourceName>,
}

impl CompilationJob {
    /// `true` for the (usually one) root file(s) this job was formed to build; `false` for
    /// files that are present only because something else imports them.
    pub fn emits_artifacts(&self, file: &SourceName) -> bool {
        self.artifact_emitting.contains(file)
    }

    pub fn artifact_emitting_files(&self) -> impl Iterator<Item = &SourceName> {
        self.artifact_emitting.iter()
    }
}

#[derive(Clone, Debug)]
pub enum JobCreationError {
    NoCompatibleVersion { file: SourceName },
    IncompatibleOverride { file: SourceName, override_version: Version },
    DirectlyImportsIncompatible { file: SourceName, incompatible: Vec<SourceName> },
    IndirectlyImportsIncompatible { file: SourceName, incompatible: Vec<(SourceName, Vec<SourceName>)> },
    Other { file: SourceName, message: String },
}

impl std::fmt::Display for JobCreationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCompatibleVersion { file } => {
                write!(f, "no configured compiler version satisfies {}", file.display())
            }
            Self::IncompatibleOverride { file, override_version } => write!(
                f,
                "override version {override_version} does not satisfy {}'s pragma",
                file.display()
            ),
            Self::DirectlyImportsIncompatible { file, incompatible } => write!(
                f,
                "{} directly imports version-incompatible file(s): {}",
                file.display(),
                incompatible.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
            ),
            Self::IndirectlyImportsIncompatible { file, incompatible } => write!(
                f,
                "{} indirectly imports version-incompatible file(s): {}",
                file.display(),
                incompatible.iter().map(|(p, _)| p.display().to_string()).collect::<Vec<_>>().join(", ")
            ),
            Self::Other { file, message } => write!(f, "{}: {message}", file.display()),
        }
    }
}

impl std::error::Error for JobCreationError {}

/// Picks the newest config in `candidates` whose version satisfies every requirement in `reqs`.
fn newest_satisfying<'a>(
    candidates: &'a [CompilerConfig],
    reqs: &[semver::VersionReq],
) -> Option<&'a CompilerConfig> {
    candidates
        .iter()
        .filter(|c| reqs.iter().all(|r| r.matches(&c.version)))
        .max_by(|a, b| a.version.cmp(&b.version))
}

fn path_to(graph: &DependencyGraph, from: &SourceName, to: &SourceName) -> Vec<SourceName> {
    let mut queue = VecDeque::from([from.clone()]);
    let mut prev: BTreeMap<SourceName, SourceName> = BTreeMap::new();
    let mut visited: BTreeSet<SourceName> = BTreeSet::from([from.clone()]);
    while let Some(current) = queue.pop_front() {
        if &current == to {
            let mut path = vec![current.clone()];
            let mut node = current;
            while let Some(p) = prev.get(&node) {
                path.push(p.clone());
                node = p.clone();
            }
            path.reverse();
            return path;
        }
        for next in graph.direct_dependencies(&current) {
            if visited.insert(next.clone()) {
                prev.insert(next.clone(), current.clone());
                queue.push_back(next.clone());
            }
        }
    }
    vec![from.clone(), to.clone()]
}

/// Plans compilation jobs for `roots` over `graph`.
///
/// `allowed_configs` is the set of compiler configurations the caller is willing to use.
/// `overrides` pins specific root files to a specific config, bypassing version selection (the
/// override must still satisfy that file's own pragma).
/// `cache_unchanged` reports whether a given file passes the incremental-cache check for a
/// chosen config; jobs whose every artifact-emitting file is unchanged are dropped.
pub fn plan_jobs(
    graph: &DependencyGraph,
    roots: &BTreeSet<SourceName>,
    allowed_configs: &[CompilerConfig],
    overrides: &BTreeMap<SourceName, CompilerConfig>,
    cache_unchanged: impl Fn(&SourceName, &CompilerConfig) -> bool,
) -> (Vec<CompilationJob>, Vec<JobCreationError>) {
    let mut errors = Vec::new();
    let mut candidates: Vec<(CompilerConfig, SourceName)> = Vec::new();

    for file in roots {
        let Some(resolved) = graph.get(file) else {
            errors.push(JobCreationError::Other {
                file: file.clone(),
                message: "root file missing from resolved graph".to_string(),
            });
            continue;
        };
        let own_req = resolved.version_req();

        if let Some(config) = overrides.get(file) {
            if let Some(req) = &own_req {
                if !req.matches(&config.version) {
                    errors.push(JobCreationError::IncompatibleOverride {
                        file: file.clone(),
                        override_version: config.version.clone(),
                    });
                    continue;
                }
            }
            candidates.push((config.clone(), file.clone()));
            continue;
        }

        let own_reqs_only: Vec<semver::VersionReq> = own_req.iter().cloned().collect();
        if newest_satisfying(allowed_configs, &own_reqs_only).is_none() {
            errors.push(JobCreationError::NoCompatibleVersion { file: file.clone() });
            continue;
        }

        let transitive = graph.transitive_dependencies(file);
        let direct: BTreeSet<SourceName> =
            graph.direct_dependencies(file).into_iter().cloned().collect();

        let mut all_reqs = Vec::new();
        if let Some(req) = &own_req {
            all_reqs.push(req.clone());
        }
        for dep in &transitive {
            if let Some(dep_file) = graph.get(dep) {
                if let Some(req) = dep_file.version_req() {
                    all_reqs.push(req);
                }
            }
        }

        if let Some(config) = newest_satisfying(allowed_configs, &all_reqs) {
            candidates.push((config.clone(), file.clone()));
            continue;
        }

        let mut direct_reqs = Vec::new();
        if let Some(req) = &own_req {
            direct_reqs.push(req.clone());
        }
        for dep in &direct {
            if let Some(dep_file) = graph.get(dep) {
                if let Some(req) = dep_file.version_req() {
                    direct_reqs.push(req);
                }
            }
        }

        if newest_satisfying(allowed_configs, &direct_reqs).is_none() {
            let incompatible = direct
                .iter()
                .filter(|dep| {
                    let Some(dep_file) = graph.get(dep) else { return false };
                    let Some(dep_req) = dep_file.version_req() else { return false };
                    let pair = own_req.iter().cloned().chain([dep_req]).collect::<Vec<_>>();
                    newest_satisfying(allowed_configs, &pair).is_none()
                })
                .cloned()
                .collect::<Vec<_>>();
            if incompatible.is_empty() {
                errors.push(JobCreationError::NoCompatibleVersion { file: file.clone() });
            } else {
                errors.push(JobCreationError::DirectlyImportsIncompatible {
                    file: file.clone(),
                    incompatible,
                });
            }
        } else {
            let incompatible = transitive
                .iter()
                .filter(|dep| !direct.contains(*dep))
                .filter(|dep| {
                    let Some(dep_file) = graph.get(dep) else { return false };
                    let Some(dep_req) = dep_file.version_req() else { return false };
                    let pair = own_req.iter().cloned().chain([dep_req]).collect::<Vec<_>>();
                    newest_satisfying(allowed_configs, &pair).is_none()
                })
                .map(|dep| (dep.clone(), path_to(graph, file, dep)))
                .collect::<Vec<_>>();
            if incompatible.is_empty() {
                errors.push(JobCreationError::NoCompatibleVersion { file: file.clone() });
            } else {
                errors.push(JobCreationError::IndirectlyImportsIncompatible {
                    file: file.clone(),
                    incompatible,
                });
            }
        }
    }

    // Step B: form one candidate job per rooted file, then merge jobs with an equal config.
    let mut merged: Vec<CompilationJob> = Vec::new();
    for (config, file) in candidates {
        let mut inputs = graph.transitive_dependencies(&file);
        inputs.insert(file.clone());

        if let Some(existing) = merged.iter_mut().find(|job| job.config == config) {
            existing.inputs.extend(inputs);
            existing.artifact_emitting.insert(file);
        } else {
            merged.push(CompilationJob {
                config,
                inputs,
                artifact_emitting: BTreeSet::from([file]),
            });
        }
    }

    // Step C: drop jobs whose every artifact-emitting file already has a valid cache entry.
    let mut surviving: Vec<CompilationJob> = merged
        .into_iter()
        .filter(|job| {
            !job.artifact_emitting_files().all(|f| cache_unchanged(f, &job.config))
        })
        .collect();

    // Step D: version-ascending order, deterministic and user-visible.
    surviving.sort_by(|a, b| a.config.version.cmp(&b.config.version));

    (surviving, errors)
}
