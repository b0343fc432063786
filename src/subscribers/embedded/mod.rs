//! # Built-in subscribers
//!
//! - [`LogWriter`]: renders pool events as `tracing` records (enabled by the `logging` feature).

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;
