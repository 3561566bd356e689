//! Throughput of running several independent Standard JSON inputs through the same `solc`
//! binary back to back, sequentially, the same access pattern the orchestrator uses within one
//! compilation job's multi-input split (Solidity + Yul).
#[macro_use]
extern crate criterion;

use criterion::Criterion;
use foundry_compilers::{
    artifacts::{Source, Sources},
    compilers::{acquire, Solc},
    config::SolcConfig,
    SolcInput, SolcSettings,
};
use semver::Version;

fn compile_many_benchmark(c: &mut Criterion) {
    let version = Version::new(0, 8, 19);
    let build = acquire(&version, &SolcConfig::default()).expect("solc 0.8.19 available");
    let solc = Solc::new(build.compiler_path, build.version);

    let inputs = load_compiler_inputs();

    let mut group = c.benchmark_group("compile many");
    group.sample_size(10);
    group.bench_function("sequential", |b| {
        b.iter(|| {
            for input in &inputs {
                let _ = solc.compile(input).unwrap();
            }
        });
    });
    group.finish();
}

/// A handful of trivial, self-contained contracts — large enough to exercise the full
/// Standard JSON round trip without depending on fixture files on disk.
fn load_compiler_inputs() -> Vec<SolcInput> {
    (0..5)
        .map(|i| {
            let mut sources = Sources::new();
            sources.insert(
                format!("Contract{i}.sol").into(),
                Source::new(format!(
                    "// SPDX-License-Identifier: MIT\npragma solidity ^0.8.0;\ncontract Contract{i} {{ uint256 public x = {i}; }}\n"
                )),
            );
            SolcInput::new(sources, SolcSettings::default())
        })
        .collect()
}

criterion_group!(benches, compile_many_benchmark);
criterion_main!(benches);
