use clap::Parser;
use furrow_client::{Cli, Command, FileConfig, Settings};
use furrow_engine::SessionEnd;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let file = FileConfig::discover(cli.config.as_deref())?;
    let settings = Settings::resolve(&cli, file)?;
    furrow_client::init_tracing(settings.log_level);

    match cli.command.unwrap_or_default() {
        Command::Watch => {
            let stop = CancellationToken::new();
            let on_ctrl_c = stop.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_ctrl_c.cancel();
                }
            });

            eprintln!("[furrow] watching game at {}", settings.server);
            let session = furrow_client::watch(&settings, std::io::stdout(), stop).await?;
            let end = session.end().cloned().unwrap_or(SessionEnd::StreamClosed);
            eprintln!(
                "[furrow] session {end} after day {}",
                session.last_day().unwrap_or(0)
            );
            if session.skipped_frames() > 0 {
                eprintln!("[furrow] skipped {} malformed frames", session.skipped_frames());
            }
            if let SessionEnd::Failed(reason) = end {
                anyhow::bail!(reason);
            }
        }
        Command::State => furrow_client::show_state(&settings, std::io::stdout()).await?,
        Command::Stop => {
            furrow_client::stop_game(&settings).await?;
            eprintln!("[furrow] stop sent to {}", settings.server);
        }
    }
    Ok(())
}
