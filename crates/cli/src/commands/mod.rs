//! CLI commands for the options pipeline.

pub mod fetch;
pub mod info;
pub mod positions;
pub mod process;
pub mod run;

pub use fetch::{run_fetch, FetchArgs};
pub use info::run_info;
pub use positions::{run_positions, PositionsArgs};
pub use process::{run_process, ProcessArgs};
pub use run::{run_pipeline, RunArgs};
