pub mod historical;
pub mod memory;
