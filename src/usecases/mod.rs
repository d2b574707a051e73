pub mod dividend_usecase;
pub mod evaluate_position;
pub mod execute_order;
pub mod submit_order;

pub use dividend_usecase::DividendUseCase;
pub use evaluate_position::EvaluatePositionUseCase;
pub use execute_order::ExecuteOrderUseCase;
pub use submit_order::SubmitOrderUseCase;
