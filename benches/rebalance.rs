//! Rebalance benchmarks: drift, trade generation, hashing and full evaluation.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use driftbook::{
    DecisionInputs, Holding, IgnoreSet, Portfolio, PriceMap, RebalanceEngine, RebalanceParams,
    Ticker, WeightMap, compute_drift, decision_hash, extract,
};

/// Generate a synthetic portfolio with `n` tickers.
///
/// Values and targets are drawn from a simple deterministic RNG so runs are
/// comparable.
fn generate_portfolio(n: usize) -> (Portfolio, PriceMap) {
    // Simple deterministic PRNG (xorshift32)
    let mut rng_state: u32 = 42;
    let mut next = move || {
        rng_state ^= rng_state << 13;
        rng_state ^= rng_state >> 17;
        rng_state ^= rng_state << 5;
        rng_state
    };

    let mut holdings = Vec::with_capacity(n + 1);
    let mut raw_targets = Vec::with_capacity(n);
    let mut prices = PriceMap::new();
    for i in 0..n {
        let name = format!("S{i:03}");
        holdings.push(Holding::new(name.as_str(), 1_000.0 + (next() % 50_000) as f64));
        raw_targets.push((name.clone(), 1 + next() % 100));
        if let Some(t) = Ticker::new(&name) {
            prices.insert(t, 10.0 + (next() % 490) as f64);
        }
    }
    holdings.push(Holding::new("CASH", 5_000.0));

    let sum: u32 = raw_targets.iter().map(|(_, w)| w).sum();
    let targets: WeightMap = raw_targets
        .into_iter()
        .filter_map(|(t, w)| Some((Ticker::new(&t)?, 100.0 * w as f64 / sum as f64)))
        .collect();

    (Portfolio::new(holdings, targets), prices)
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let engine = RebalanceEngine::new(RebalanceParams::default());

    for n in [2usize, 20, 200, 2_000] {
        let (portfolio, prices) = generate_portfolio(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| engine.evaluate(black_box(&portfolio), Some(black_box(&prices))))
        });
    }
    group.finish();
}

fn bench_drift(c: &mut Criterion) {
    let (portfolio, _) = generate_portfolio(500);
    let valuation = extract(&portfolio.holdings);
    let ignored = IgnoreSet::default();

    c.bench_function("compute_drift_500", |b| {
        b.iter(|| {
            compute_drift(
                black_box(&valuation.weights),
                black_box(&portfolio.allocations),
                &ignored,
            )
        })
    });
}

fn bench_hash(c: &mut Criterion) {
    let (portfolio, _) = generate_portfolio(500);
    let valuation = extract(&portfolio.holdings);

    c.bench_function("decision_hash_500", |b| {
        b.iter(|| {
            decision_hash(black_box(&DecisionInputs {
                current_weights: &valuation.weights,
                target_weights: &portfolio.allocations,
                portfolio_value: valuation.total,
                drift_threshold: 0.03,
                min_trade_usd: 50.0,
                turnover_cap: Some(0.15),
            }))
        })
    });
}

criterion_group!(benches, bench_evaluate, bench_drift, bench_hash);
criterion_main!(benches);
