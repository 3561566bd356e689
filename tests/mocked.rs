//! Exercises [`TempProject`] and [`CompilerCache`] plumbing without invoking a real `solc`
//! binary — everything here runs with just the `project-util` feature.

use foundry_compilers::{cache::CompilerCache, project_util::TempProject};

#[test]
fn temp_project_layout_is_created_eagerly() {
    let project = TempProject::new().unwrap();
    assert!(project.paths.sources.is_dir());
    assert!(project.paths.artifacts.is_dir());
}

#[test]
fn added_source_is_readable_back_from_disk() {
    let project = TempProject::new().unwrap();
    let name = project
        .add_source("Counter", "pragma solidity ^0.8.0;\ncontract Counter { uint256 public x; }\n")
        .unwrap();
    let on_disk = project.paths.sources.join(&name);
    let content = std::fs::read_to_string(on_disk).unwrap();
    assert!(content.contains("contract Counter"));
}

#[test]
fn added_library_file_is_resolvable_under_its_package_directory() {
    let mut project = TempProject::new().unwrap();
    let name = project
        .add_lib("forge-std", "Test", "pragma solidity ^0.8.0;\nabstract contract Test {}\n")
        .unwrap();
    assert_eq!(name, std::path::PathBuf::from("forge-std").join("Test.sol"));
    assert_eq!(project.paths.libraries.len(), 1);
}

#[test]
fn empty_cache_reports_every_file_as_changed() {
    let project = TempProject::new().unwrap();
    let cache = CompilerCache::read(&project.paths.cache);
    assert!(cache.has_file_changed(std::path::Path::new("Counter.sol"), "deadbeef", None));
}
