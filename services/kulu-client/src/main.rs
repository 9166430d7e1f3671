//! kulu - Kulu İlan 命令行客户端

use clap::Parser;
use kulu_bootstrap::{Infrastructure, init_runtime, install_metrics};
use kulu_client::api::cli::{Cli, execute};
use kulu_client::application::SessionService;
use kulu_config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config_dir)?;
    init_runtime(&config);
    let metrics = if cli.metrics { install_metrics() } else { None };

    let infra = Infrastructure::from_config(config).await?;
    let service = SessionService::new(infra.cache(), infra.backend(), infra.notifier());

    let result = execute(cli.command, &service, &infra).await;

    if let Some(handle) = metrics {
        print!("{}", handle.render());
    }
    result
}
