//! Shows the working directories and the instrument table.

use crate::workspace::Workspace;
use fx_options_core::{AppConfig, Instrument};
use fx_options_data::OptionsPipeline;

/// Runs the info command.
pub fn run_info(config: &AppConfig) {
    let workspace = Workspace::from_config(config);
    let pipeline = OptionsPipeline::new(&workspace.normalized, &workspace.output);

    println!("Directories");
    println!("  base:       {}", workspace.base.display());
    println!("  legacy:     {}", workspace.legacy.display());
    println!("  normalized: {}", workspace.normalized.display());
    println!("  output:     {}", workspace.output.display());
    println!();
    println!(
        "{:<5} {:>8} {:>12}  {:<8} {:<30} sheet",
        "code", "product", "coefficient", "symbol", "option type"
    );
    for instrument in Instrument::ALL {
        let sheet = pipeline
            .sheet_path(instrument)
            .map_or_else(|| "-".to_string(), |p| p.display().to_string());
        println!(
            "{:<5} {:>8} {:>12}  {:<8} {:<30} {}",
            instrument.code(),
            instrument.product_id(),
            instrument.coefficient(),
            instrument.symbol(),
            instrument.header_label(),
            sheet
        );
    }
}
