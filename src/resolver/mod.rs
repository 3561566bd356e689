//! Source resolution and dependency-graph construction.
//!
//! [`Resolver::resolve`] turns a single [`SourceName`] into a [`ResolvedFile`], reading its text
//! once and extracting imports/pragmas lexically. [`DependencyGraph::build`] drives that
//! resolution by BFS from a set of root source names until the node set is closed under imports,
//! and exposes the connected-component and transitive-dependency queries the job planner needs.

pub mod parse;

use crate::{
    error::{Result, ResultExt, SolcError},
    utils,
};
use auto_impl::auto_impl;
use parse::SolData;
use std::{
    collections::{BTreeMap, BTreeSet, HashSet, VecDeque},
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

/// A forward-slash, project- (or package-) relative logical path. Keys all file identity.
pub type SourceName = PathBuf;

/// A fully loaded and lexically-scanned source file. Immutable once constructed.
#[derive(Clone, Debug)]
pub struct ResolvedFile {
    pub source_name: SourceName,
    pub absolute_path: PathBuf,
    pub content_text: Arc<String>,
    pub content_hash: String,
    pub last_modification_time: SystemTime,
    pub imports: Vec<SourceName>,
    pub version_pragmas: Vec<String>,
    pub package_name: Option<String>,
}

impl ResolvedFile {
    pub fn version_req(&self) -> Option<semver::VersionReq> {
        self.version_pragmas.iter().fold(None, |acc, pragma| {
            let Ok(req) = utils::parse_version_req(pragma) else { return acc };
            match acc {
                None => Some(req),
                Some(mut combined) => {
                    combined.comparators.extend(req.comparators);
                    Some(combined)
                }
            }
        })
    }
}

/// Resolves a third-party package name (the first path component of a package-rooted
/// [`SourceName`]) to the directory it lives under on disk. Analogous to a `node_modules`
/// lookup, but caller-pluggable so embedders can point it at whatever vendoring scheme they use.
#[auto_impl(&, Box, Arc)]
pub trait PackageLookup: Send + Sync {
    fn lookup_package(&self, name: &str) -> Option<PathBuf>;
}

/// A [`PackageLookup`] that searches a fixed list of library directories for a top-level
/// directory named after the package, mirroring how `lib/` dependencies are vendored in
/// foundry-style projects.
#[derive(Clone, Debug, Default)]
pub struct LibraryPackageLookup {
    pub libraries: Vec<PathBuf>,
}

impl PackageLookup for LibraryPackageLookup {
    fn lookup_package(&self, name: &str) -> Option<PathBuf> {
        self.libraries.iter().map(|lib| lib.join(name)).find(|dir| dir.is_dir())
    }
}

/// Resolves [`SourceName`]s to [`ResolvedFile`]s under a single project root, caching lookups
/// for the lifetime of one build.
pub struct Resolver<P> {
    root: PathBuf,
    sources_dirs: Vec<PathBuf>,
    package_lookup: P,
    cache: std::cell::RefCell<BTreeMap<SourceName, ResolvedFile>>,
}

impl<P: PackageLookup> Resolver<P> {
    pub fn new(root: impl Into<PathBuf>, sources_dirs: Vec<PathBuf>, package_lookup: P) -> Self {
        Self {
            root: root.into(),
            sources_dirs,
            package_lookup,
            cache: std::cell::RefCell::new(BTreeMap::new()),
        }
    }

    /// Resolves a single source name, reusing a cached result if this build has already loaded it.
    pub fn resolve(&self, source_name: &SourceName) -> Result<ResolvedFile> {
        if let Some(cached) = self.cache.borrow().get(source_name) {
            return Ok(cached.clone());
        }

        let (absolute_path, package_name) = self.locate(source_name)?;
        let resolved = self.load(source_name, &absolute_path, package_name)?;
        self.cache.borrow_mut().insert(source_name.clone(), resolved.clone());
        Ok(resolved)
    }

    /// Resolves every name in `source_names`, independently (parallelizable: each lookup is a
    /// pure function of the filesystem). Returns resolved files and any per-file errors.
    pub fn resolve_many(
        &self,
        source_names: impl IntoIterator<Item = SourceName>,
    ) -> (Vec<ResolvedFile>, Vec<SolcError>) {
        let mut resolved = Vec::new();
        let mut errors = Vec::new();
        for name in source_names {
            match self.resolve(&name) {
                Ok(file) => resolved.push(file),
                Err(err) => errors.push(err),
            }
        }
        (resolved, errors)
    }

    /// Canonicalizes an import written inside `importer`'s text into a [`SourceName`].
    pub fn canonicalize_import(&self, importer: &SourceName, import: &str) -> Result<SourceName> {
        if import.starts_with('.') {
            let importer_dir = importer.parent().unwrap_or_else(|| Path::new(""));
            return utils::rebase_import(importer_dir, import)
                .ok_or_else(|| SolcError::IllegalImport(importer.clone(), import.to_string()));
        }
        // Not a relative path: already a package- or project-rooted SourceName.
        Ok(PathBuf::from(import))
    }

    fn locate(&self, source_name: &SourceName) -> Result<(PathBuf, Option<String>)> {
        for dir in std::iter::once(&self.root).chain(self.sources_dirs.iter()) {
            let candidate = dir.join(source_name);
            if candidate.is_file() {
                return Ok((candidate, None));
            }
        }

        let mut components = source_name.components();
        if let Some(std::path::Component::Normal(package)) = components.next() {
            let package = package.to_string_lossy().into_owned();
            if let Some(package_root) = self.package_lookup.lookup_package(&package) {
                let rest: PathBuf = components.collect();
                let candidate = package_root.join(&rest);
                if candidate.is_file() {
                    return Ok((candidate, Some(package)));
                }
                return Err(SolcError::FileNotFound(source_name.display().to_string()));
            }
            return Err(SolcError::PackageNotInstalled(package));
        }

        Err(SolcError::FileNotFound(source_name.display().to_string()))
    }

    fn load(
        &self,
        source_name: &SourceName,
        absolute_path: &Path,
        package_name: Option<String>,
    ) -> Result<ResolvedFile> {
        let content = fs::read_to_string(absolute_path).map_io_err(absolute_path)?;
        let metadata = fs::metadata(absolute_path).map_io_err(absolute_path)?;
        let last_modification_time = metadata.modified().map_io_err(absolute_path)?;
        let content_hash = utils::content_hash(&content);

        let data = SolData::parse(&content, absolute_path);
        let mut imports = Vec::with_capacity(data.imports.len());
        for import in &data.imports {
            imports.push(self.canonicalize_import(source_name, import)?);
        }

        Ok(ResolvedFile {
            source_name: source_name.clone(),
            absolute_path: absolute_path.to_path_buf(),
            content_text: Arc::new(content),
            content_hash,
            last_modification_time,
            imports,
            version_pragmas: data.version_pragmas,
            package_name,
        })
    }
}

/// A directed graph of [`ResolvedFile`]s, closed under imports. Cycles are permitted.
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    pub files: BTreeMap<SourceName, ResolvedFile>,
}

impl DependencyGraph {
    /// Builds the graph by BFS from `roots`, resolving every newly-discovered import until the
    /// node set is closed. Returns the graph plus any resolution errors encountered along the
    /// way (a file that fails to resolve simply isn't added, and planning on files that depend
    /// on it will itself fail — the caller decides whether any errors are fatal).
    pub fn build<P: PackageLookup>(
        resolver: &Resolver<P>,
        roots: impl IntoIterator<Item = SourceName>,
    ) -> (Self, Vec<SolcError>) {
        let mut files = BTreeMap::new();
        let mut errors = Vec::new();
        let mut queue: VecDeque<SourceName> = roots.into_iter().collect();
        let mut visited: HashSet<SourceName> = HashSet::new();

        while let Some(name) = queue.pop_front() {
            if !visited.insert(name.clone()) {
                continue;
            }
            match resolver.resolve(&name) {
                Ok(file) => {
                    for import in &file.imports {
                        if !visited.contains(import) {
                            queue.push_back(import.clone());
                        }
                    }
                    files.insert(name, file);
                }
                Err(err) => errors.push(err),
            }
        }

        (Self { files }, errors)
    }

    pub fn get(&self, name: &SourceName) -> Option<&ResolvedFile> {
        self.files.get(name)
    }

    pub fn direct_dependencies(&self, name: &SourceName) -> Vec<&SourceName> {
        self.files
            .get(name)
            .map(|f| f.imports.iter().filter(|i| self.files.contains_key(*i)).collect())
            .unwrap_or_default()
    }

    pub fn direct_dependents(&self, name: &SourceName) -> Vec<&SourceName> {
        self.files
            .iter()
            .filter(|(_, file)| file.imports.iter().any(|i| i == name))
            .map(|(n, _)| n)
            .collect()
    }

    /// All files reachable from `name` by following imports, not including `name` itself.
    /// Guards against cycles with a visited set; never infinite-loops on self-imports.
    pub fn transitive_dependencies(&self, name: &SourceName) -> BTreeSet<SourceName> {
        let mut visited = BTreeSet::new();
        let mut stack = vec![name.clone()];
        while let Some(current) = stack.pop() {
            let Some(file) = self.files.get(&current) else { continue };
            for import in &file.imports {
                if self.files.contains_key(import) && visited.insert(import.clone()) {
                    stack.push(import.clone());
                }
            }
        }
        visited
    }

    /// Weakly connected components: files joined by an undirected path of imports (in either
    /// direction) end up in the same component.
    pub fn connected_components(&self) -> Vec<Vec<SourceName>> {
        let mut undirected: BTreeMap<&SourceName, BTreeSet<&SourceName>> = BTreeMap::new();
        for (name, file) in &self.files {
            undirected.entry(name).or_default();
            for import in &file.imports {
                if self.files.contains_key(import) {
                    undirected.entry(name).or_default().insert(import);
                    undirected.entry(import).or_default().insert(name);
                }
            }
        }

        let mut seen: HashSet<&SourceName> = HashSet::new();
        let mut components = Vec::new();
        for root in self.files.keys() {
            if seen.contains(root) {
                continue;
            }
            let mut component = Vec::new();
            let mut queue = VecDeque::from([root]);
            seen.insert(root);
            while let Some(node) = queue.pop_front() {
                component.push(node.clone());
                for neighbor in undirected.get(node).into_iter().flatten() {
                    if seen.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
            component.sort();
            components.push(component);
        }
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = fs::File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn diamond_imports_close_the_graph() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "A.sol", "pragma solidity ^0.8.0;\nimport \"./B.sol\";\nimport \"./C.sol\";\n");
        write_file(dir.path(), "B.sol", "pragma solidity ^0.8.0;\nimport \"./D.sol\";\n");
        write_file(dir.path(), "C.sol", "pragma solidity ^0.8.0;\nimport \"./D.sol\";\n");
        write_file(dir.path(), "D.sol", "pragma solidity ^0.8.0;\n");

        let resolver = Resolver::new(dir.path(), vec![], LibraryPackageLookup::default());
        let (graph, errors) = DependencyGraph::build(&resolver, [PathBuf::from("A.sol")]);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(graph.files.len(), 4);

        let transitive = graph.transitive_dependencies(&PathBuf::from("A.sol"));
        assert_eq!(
            transitive,
            BTreeSet::from([PathBuf::from("B.sol"), PathBuf::from("C.sol"), PathBuf::from("D.sol")])
        );

        let components = graph.connected_components();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].len(), 4);
    }

    #[test]
    fn import_cycles_terminate() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "A.sol", "pragma solidity ^0.8.0;\nimport \"./B.sol\";\n");
        write_file(dir.path(), "B.sol", "pragma solidity ^0.8.0;\nimport \"./A.sol\";\n");

        let resolver = Resolver::new(dir.path(), vec![], LibraryPackageLookup::default());
        let (graph, errors) = DependencyGraph::build(&resolver, [PathBuf::from("A.sol")]);
        assert!(errors.is_empty());
        assert_eq!(graph.files.len(), 2);
        let transitive = graph.transitive_dependencies(&PathBuf::from("A.sol"));
        assert_eq!(transitive, BTreeSet::from([PathBuf::from("B.sol")]));
    }

    #[test]
    fn unrelated_roots_form_separate_components() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "A.sol", "pragma solidity ^0.7.0;\n");
        write_file(dir.path(), "B.sol", "pragma solidity ^0.8.0;\n");

        let resolver = Resolver::new(dir.path(), vec![], LibraryPackageLookup::default());
        let (graph, errors) =
            DependencyGraph::build(&resolver, [PathBuf::from("A.sol"), PathBuf::from("B.sol")]);
        assert!(errors.is_empty());
        assert_eq!(graph.connected_components().len(), 2);
    }

    #[test]
    fn missing_import_is_reported_not_fatal_to_the_rest_of_the_graph() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "A.sol", "pragma solidity ^0.8.0;\nimport \"./Missing.sol\";\n");

        let resolver = Resolver::new(dir.path(), vec![], LibraryPackageLookup::default());
        let (graph, errors) = DependencyGraph::build(&resolver, [PathBuf::from("A.sol")]);
        assert_eq!(graph.files.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SolcError::FileNotFound(_)));
    }

    #[test]
    fn escaping_import_is_illegal() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "a/A.sol", "pragma solidity ^0.8.0;\nimport \"../../../etc/passwd\";\n");

        let resolver = Resolver::new(dir.path(), vec![], LibraryPackageLookup::default());
        let (_graph, errors) = DependencyGraph::build(&resolver, [PathBuf::from("a/A.sol")]);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SolcError::IllegalImport(_, _)));
    }
}
