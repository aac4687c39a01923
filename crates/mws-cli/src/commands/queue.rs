use mws_core::Engine;

use crate::commands::common::format_queue_lines;
use crate::error::CliError;

pub async fn run_queue(engine: &Engine, as_json: bool) -> Result<(), CliError> {
    let records = engine.queue().drain_in_order().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        println!("No queued writes.");
    } else {
        for line in format_queue_lines(&records) {
            println!("{line}");
        }
    }
    Ok(())
}
