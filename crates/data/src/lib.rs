//! Acquisition, sheet parsing and result storage for the CME FX options pipeline.
//!
//! This crate provides:
//! - Exchange workbook and futures-archive downloads (`reqwest`)
//! - Workbook reading (`calamine`) and the normalized CSV grid (`csv`)
//! - Table location and row extraction
//! - Atomic JSON result storage
//! - The per-instrument processing pipeline

pub mod cftc;
pub mod client;
pub mod cme;
pub mod extractor;
pub mod json_storage;
pub mod locator;
pub mod normalizer;
pub mod pipeline;
pub mod positions;
pub mod sheet;

pub use cftc::{cleanup_temp_files, extract_archive, CftcClient};
pub use client::{build_http_client, FetchError};
pub use cme::{legacy_workbook_path, trade_date, CmeClient, DownloadReport};
pub use extractor::{Column, Extraction, RowExtractor, SkipReason, SkippedRow};
pub use json_storage::{JsonStorage, WriteError, POSITIONS_FILE_NAME};
pub use locator::{LayoutError, Marker, RegionLocator};
pub use normalizer::{FormatNormalizer, NormalizeReport};
pub use pipeline::{InstrumentError, OptionsPipeline};
pub use positions::{FuturesPosition, PositionsError, PositionsProcessor};
pub use sheet::{Cell, SheetError, Worksheet};
