/// Backing store for the stock list
///
/// The whole list lives in one JSON array file. Reads parse the full file and
/// writes replace it; there is no per-record persistence.

pub mod errors;
pub mod stock_file;

pub use errors::StoreError;
pub use stock_file::StockStore;
