use mws_core::Engine;

use crate::error::CliError;

pub async fn run_flush(engine: &Engine) -> Result<(), CliError> {
    if !engine.connectivity().is_online() {
        println!("Offline: {} write(s) left queued", engine.queue().len().await?);
        return Ok(());
    }

    let report = engine.flush().await?;
    println!(
        "Replayed {} write(s), {} remaining",
        report.replayed, report.remaining
    );
    Ok(())
}
