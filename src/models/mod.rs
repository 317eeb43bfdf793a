pub mod quote;
pub mod status;
pub mod stock;

pub use quote::QuoteSnapshot;
pub use status::JobStatus;
pub use stock::StockRecord;
