use criterion::{criterion_group, criterion_main, Criterion};
use rand::SeedableRng;

use rebalancer::domain::config::{GuardrailConfig, OrderPolicy, TriggerConfig};
use rebalancer::domain::ids::{PortfolioId, PositionId, TenantId};
use rebalancer::infra::historical::Historian;
use rebalancer::orchestrator::{SimulationConfig, SimulationOrchestrator};
use rebalancer::position::Position;
use rebalancer::services::guardrail::evaluate_guardrails;
use rebalancer::services::sizing::compute_sizing;
use rebalancer::services::trigger::TriggerDirection;
use rebalancer::types::{CashValue, EngineDateTime, Price, Shares};

fn fresh_position() -> Position {
    Position::new(
        TenantId::from("bench-tenant"),
        PortfolioId::from("bench-portfolio"),
        PositionId::from("bench-position"),
        "ABC",
        CashValue::from(100_000.0),
        Shares::from(0.0),
        Some(Price::from(100.0)),
        TriggerConfig::default(),
        GuardrailConfig::default(),
        OrderPolicy::default(),
        EngineDateTime::from(0_i64),
    )
}

fn full_backtest_random_walk() {
    let start = EngineDateTime::from(0_i64);
    let days = 250;
    let end = EngineDateTime::from(i64::from(days) * 86_400);

    let mut historian = Historian::new();
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    historian.generate_random_walk("ABC", start, days, 100.0, 0.015, &mut rng);

    let orchestrator = SimulationOrchestrator::new(SimulationConfig::default());
    orchestrator
        .run(fresh_position(), &historian, start, end)
        .unwrap();
}

fn sizing_and_guardrail_hot_path() {
    let position = fresh_position();
    let sizing = compute_sizing(
        TriggerDirection::Buy,
        Price::from(97.0),
        Price::from(100.0),
        position.qty,
        position.cash,
        &position.order_policy,
        &position.guardrail_config,
    );
    evaluate_guardrails(
        TriggerDirection::Buy,
        sizing.qty,
        position.qty,
        position.cash,
        Price::from(97.0),
        CashValue::from(1.0),
        &position.guardrail_config,
        0,
        position.order_policy.min_notional,
    );
}

fn benchmarks(c: &mut Criterion) {
    c.bench_function("full backtest random walk", |b| b.iter(full_backtest_random_walk));
    c.bench_function("sizing and guardrail hot path", |b| {
        b.iter(sizing_and_guardrail_hot_path)
    });
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
