//! Demo CLI: replays a synthetic random-walk price path through one position
//! and prints the resulting simulation summary. Run with
//! `cargo run --bin simulate -- ACME 180`.

use std::env;

use rand::SeedableRng;

use rebalancer::domain::config::{GuardrailConfig, OrderPolicy, TriggerConfig};
use rebalancer::domain::ids::{PortfolioId, PositionId, TenantId};
use rebalancer::infra::historical::Historian;
use rebalancer::orchestrator::{SimulationConfig, SimulationOrchestrator};
use rebalancer::position::Position;
use rebalancer::types::{CashValue, EngineDateTime, Price, Shares};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ticker = args.get(1).cloned().unwrap_or_else(|| "ACME".to_string());
    let days: u32 = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(180);

    let start = EngineDateTime::from(0_i64);
    let end = EngineDateTime::from(i64::from(days) * 86_400);

    let mut historian = Historian::new();
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    historian.generate_random_walk(&ticker, start, days, 100.0, 0.015, &mut rng);

    let position = Position::new(
        TenantId::from("demo-tenant"),
        PortfolioId::from("demo-portfolio"),
        PositionId::from("demo-position"),
        ticker.clone(),
        CashValue::from(10_000.0),
        Shares::from(0.0),
        Some(Price::from(100.0)),
        TriggerConfig::default(),
        GuardrailConfig::default(),
        OrderPolicy::default(),
        start,
    );

    let orchestrator = SimulationOrchestrator::new(SimulationConfig::default());
    let result = orchestrator.run(position, &historian, start, end)?;

    println!("ticker: {ticker}");
    println!("days simulated: {days}");
    println!("initial cash: {:.2}", result.initial_cash);
    println!("final cash: {:.2}", result.final_cash);
    println!("final qty: {:.4}", result.final_qty);
    println!("final value: {:.2}", result.final_value);
    println!("total return: {:.4}%", result.total_return * 100.0);
    println!("buy & hold return: {:.4}%", result.buy_and_hold_return * 100.0);
    println!("trades executed: {}", result.trades.len());
    println!("events logged: {}", result.events.len());
    println!("timeline rows: {}", result.timeline.len());

    Ok(())
}
