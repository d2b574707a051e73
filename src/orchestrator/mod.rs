pub mod live;
pub mod simulation;

pub use live::{LiveOrchestrator, TradingState};
pub use simulation::{SimulationConfig, SimulationOrchestrator, SimulationResult};
