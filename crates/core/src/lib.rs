//! Core types for the CME FX options pipeline.
//!
//! This crate provides:
//! - Layered configuration (`figment`)
//! - The instrument table and option-chain types
//! - SIP/FOB metrics calculation
//! - Close price sources and strike-unit conversion
//! - Run outcome reporting

pub mod chain;
pub mod config;
pub mod config_loader;
pub mod instrument;
pub mod metrics;
pub mod price;
pub mod report;
pub mod summary_formatter;
pub mod traits;

pub use chain::{OptionChain, OptionRow, RangeSpec, SheetRanges, Side};
pub use config::{AppConfig, PathsConfig, SourcesConfig};
pub use config_loader::ConfigLoader;
pub use instrument::{Instrument, Quoting};
pub use metrics::{
    FobMetrics, MetricsCalculator, MetricsError, MetricsParams, MetricsResult, SipMetrics,
    StrikePoint, StrikeTable,
};
pub use price::{ClosePrices, DefaultQuotes, PriceError, Quotes, QuotesFile};
pub use report::{InstrumentOutcome, Outcome, RunReport, Stage};
pub use summary_formatter::{format_duration, StageTimings, SummaryFormatter};
pub use traits::ClosePriceSource;
