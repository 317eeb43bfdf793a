// Library Crate Root
// lib.rs

// main.rs builds the server from these modules like an external crate would
pub mod api;
pub mod config;
pub mod jobs;
pub mod market_hours;
pub mod models;
pub mod provider;
pub mod scheduler;
pub mod startup;
pub mod store;

// pub use = re-export at crate root
pub use api::{create_router, AppState};
pub use config::{RefreshConfig, ServerConfig};
pub use jobs::{CycleOutcome, MarketCapRefresher};
pub use models::{JobStatus, QuoteSnapshot, StockRecord};
pub use provider::{QuoteProvider, YahooProvider};
pub use scheduler::RefreshScheduler;
pub use store::{StockStore, StoreError};
