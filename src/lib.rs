pub mod apis;
pub mod common;
pub mod config;
pub mod logging;
pub mod normalize;
pub mod output;
pub mod registry;
pub mod scanner;

pub use common::{Result, ScanError};
pub use registry::ProviderRegistry;
pub use scanner::{CancelToken, ScanRequest, ScanSummary, Scanner};
