pub mod forced_outcome;
pub mod prize_stocks;
pub mod spin_logs;

pub use forced_outcome as forced_outcome_entity;
pub use prize_stocks as prize_stock_entity;
pub use spin_logs as spin_log_entity;
