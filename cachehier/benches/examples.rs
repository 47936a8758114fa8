use cachehier::config::{CacheConfig, CacheKindConfig, LayeredCacheConfig, ReplacementPolicyConfig};
use cachehier::simulator::Simulator;
use cachehier::util::synthetic_trace;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn single(kind: CacheKindConfig, policy: ReplacementPolicyConfig) -> LayeredCacheConfig {
    LayeredCacheConfig {
        caches: vec![CacheConfig {
            name: format!("{kind:?}-{policy:?}"),
            size: 32 * 1024,
            line_size: 64,
            kind,
            replacement_policy: policy,
        }],
    }
}

fn two_level() -> LayeredCacheConfig {
    LayeredCacheConfig {
        caches: vec![
            CacheConfig {
                name: "L1".to_string(),
                size: 32 * 1024,
                line_size: 64,
                kind: CacheKindConfig::EightWay,
                replacement_policy: ReplacementPolicyConfig::LeastRecentlyUsed,
            },
            CacheConfig {
                name: "L2".to_string(),
                size: 1024 * 1024,
                line_size: 64,
                kind: CacheKindConfig::Full,
                replacement_policy: ReplacementPolicyConfig::LeastFrequentlyUsed,
            },
        ],
    }
}

/// Benchmarks whole simulations, including trace decoding, over a generated trace
pub fn criterion_benchmark(c: &mut Criterion) {
    const ACCESSES: usize = 200_000;
    let mut group = c.benchmark_group("Examples");
    // For the purposes of this we aren't interested in IO effects, the trace lives in memory
    let trace = synthetic_trace(ACCESSES, 4 * 1024 * 1024, 42).unwrap();
    group.throughput(Throughput::Elements(ACCESSES as u64));

    let mut configs = vec![("two level".to_string(), two_level())];
    for kind in [CacheKindConfig::Direct, CacheKindConfig::FourWay, CacheKindConfig::Full] {
        for policy in [
            ReplacementPolicyConfig::RoundRobin,
            ReplacementPolicyConfig::LeastRecentlyUsed,
            ReplacementPolicyConfig::LeastFrequentlyUsed,
        ] {
            if kind == CacheKindConfig::Direct && policy != ReplacementPolicyConfig::RoundRobin {
                continue;
            }
            configs.push((format!("{kind:?} {policy:?}"), single(kind, policy)));
        }
    }

    for (name, config) in &configs {
        group.bench_with_input(BenchmarkId::new("Example", name), config, |bench, conf| {
            bench.iter(|| {
                Simulator::new(conf).unwrap().simulate(&trace).unwrap().main_memory_accesses
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default().significance_level(0.1).sample_size(10);
    targets = criterion_benchmark
);
criterion_main!(benches);
