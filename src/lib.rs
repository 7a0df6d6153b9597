// Core modules
pub mod event;
pub mod account;
pub mod error;
pub mod rate_limiter;
pub mod clients;
pub mod filters;
pub mod orderbook_resolver;
pub mod arbitrage_detector;
pub mod scanner;

// Account dump
pub mod summary;
pub mod output;
pub mod dump;

// Sportsbook comparison
pub mod edge;

// Binary support
pub mod config;
pub mod render;

// Re-exports
pub use event::{BookLevel, Event, Market, Orderbook};
pub use error::{ApiError, DumpError, ScanError};
pub use rate_limiter::RateLimiter;
pub use clients::{MarketDataSource, OddsClient, PolymarketClient};
pub use filters::{MarketFilters, PreFilter};
pub use arbitrage_detector::{ArbOpportunity, ArbitrageDetector, OutcomePrice};
pub use scanner::{ArbScanner, ScanArbInput, ScanProgress, ScanStage};
pub use dump::{dump_account, DumpAccountInput, DumpAccountResult, DumpProgress, DumpStage};
pub use edge::{calculate_edges, Edge, Signal};
pub use config::Settings;
