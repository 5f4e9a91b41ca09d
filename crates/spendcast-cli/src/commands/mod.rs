//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init) and shared utilities (open_db)
//! - `forecast` - Expense forecast command
//! - `serve` - Web server command
//! - `transactions` - Transaction commands (add, import)

pub mod core;
pub mod forecast;
pub mod serve;
pub mod transactions;

// Re-export command functions for main.rs
pub use core::*;
pub use forecast::*;
pub use serve::*;
pub use transactions::*;
