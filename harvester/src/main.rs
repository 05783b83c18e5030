use eyre::Context;
use jiff::Timestamp;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use yt_comment_harvester::auth;
use yt_comment_harvester::config::Config;
use yt_comment_harvester::harvest::{self, HarvestPlan};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(std::io::stdout().is_terminal())
        .init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref()).await?;

    let yt = auth::authenticate(&config)
        .await
        .context("authorize with YouTube")?;

    let user_channel_ids = if config.user_channel_ids.is_empty() {
        auth::own_channel_ids(&yt)
            .await
            .context("discover the user's channels")?
    } else {
        config.user_channel_ids.clone()
    };

    let plan = HarvestPlan::from_config(&config, user_channel_ids, Timestamp::now())?;
    let summary = harvest::run(&yt, &plan).await?;
    tracing::info!(?summary, "harvest complete");

    Ok(())
}
