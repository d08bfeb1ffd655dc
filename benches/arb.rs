use alloy::primitives::{Address, U256};
use arbloop::arb::path::EvaluateOptions;
use arbloop::arb::types::{Hop, PathRequest};
use arbloop::chain::MemoryChain;
use arbloop::config::EngineConfig;
use arbloop::engine::ArbEngine;
use arbloop::guard::MevProtection;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::str::FromStr;

/// Generate a new random address
fn generate_random_address() -> Address {
    let addr_str = format!("0x{:040x}", fastrand::u64(..));
    Address::from_str(&addr_str).unwrap()
}

/// A ring of `length` pools starting and ending in `base`, each priced a
/// little above parity so that most rings are profitable
fn generate_ring(chain: &mut MemoryChain, base: Address, length: usize) -> Vec<Hop> {
    let mut tokens: Vec<Address> = (1..length).map(|_| generate_random_address()).collect();
    tokens.insert(0, base);
    tokens.push(base);

    tokens
        .windows(2)
        .map(|pair| {
            let pool = generate_random_address();
            let reserve_in = fastrand::u64(1_000_000_000..10_000_000_000);
            let premium = fastrand::u64(1_000..1_050);
            let reserve_out = reserve_in / 1_000 * premium;
            // alternate orientation so both swap directions are exercised
            if fastrand::bool() {
                chain.add_pair(pool, pair[0], pair[1], U256::from(reserve_in), U256::from(reserve_out));
            } else {
                chain.add_pair(pool, pair[1], pair[0], U256::from(reserve_out), U256::from(reserve_in));
            }
            Hop::new(pool, 30)
        })
        .collect()
}

/// Engine with rate limiting off so every iteration may execute
fn bench_engine(base: Address, engine: Address, owner: Address) -> ArbEngine {
    let mut config = EngineConfig::new(base, engine, owner);
    config.mev = MevProtection {
        enabled: false,
        ..MevProtection::default()
    };
    config.suboptimal_guard = false;
    ArbEngine::new(config).unwrap()
}

/// Benchmark dry runs of paths of every supported length
fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    group.sample_size(50);

    let base = generate_random_address();
    let address = generate_random_address();
    let engine = bench_engine(base, address, generate_random_address());

    for length in 2..=5 {
        let mut chain = MemoryChain::new();
        chain.mint(base, address, U256::from(1_000_000_000_u64));
        let hops = generate_ring(&mut chain, base, length);
        let request = PathRequest::new(hops, U256::from(1_000_000), U256::ZERO);

        match engine.evaluate(&mut chain, &request, EvaluateOptions::default()) {
            Ok(trace) => println!("{length} hops: {trace}"),
            Err(e) => println!("{length} hops: rejected ({e})"),
        }

        group.bench_with_input(BenchmarkId::from_parameter(length), &length, |b, _| {
            b.iter(|| {
                black_box(engine.evaluate(&mut chain, &request, EvaluateOptions::default()))
            });
        });
    }
    group.finish();
}

/// Benchmark atomic execution, including the journal commit
fn bench_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute_path");
    group.sample_size(50);

    let base = generate_random_address();
    let address = generate_random_address();
    let owner = generate_random_address();

    for length in [3, 5] {
        let mut chain = MemoryChain::new();
        chain.mint(base, address, U256::from(1_000_000_000_u64));
        let hops = generate_ring(&mut chain, base, length);
        let request = PathRequest::new(hops, U256::from(1_000_000), U256::ZERO);

        group.bench_with_input(BenchmarkId::from_parameter(length), &length, |b, _| {
            b.iter_batched(
                || (chain.clone(), bench_engine(base, address, owner)),
                |(mut chain, mut engine)| {
                    black_box(engine.execute_path(&mut chain, owner, &request, u64::MAX))
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_execute);
criterion_main!(benches);
