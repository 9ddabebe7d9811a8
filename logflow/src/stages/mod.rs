//! Specialized pipeline stages.
//!
//! Correlation, timing, buffering and caching run inside scope
//! branches; filtering, destructuring, renaming and the terminal echo
//! run on the main chain.

mod buffer;
mod cache;
mod correlation;
mod destructure;
mod echo;
mod elapsed;
mod filter;
mod logger_name;
mod rename;

pub use buffer::BufferStage;
pub use cache::BoundedCacheStage;
pub use correlation::{
    CorrelationStage, CORRELATION_CHAIN_PROPERTY, CORRELATION_HANDLE_PROPERTY,
    CORRELATION_ID_PROPERTY,
};
pub use destructure::DestructureStage;
pub use echo::EchoStage;
pub use elapsed::{ElapsedStage, ELAPSED_PROPERTY};
pub use filter::FilterStage;
pub use logger_name::{LoggerNameStage, LOGGER_PROPERTY};
pub use rename::RenameStage;
