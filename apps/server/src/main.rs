use anyhow::Context;
use wed::bootstrap;
use wed::domain::config::ApiConfig;
use wed::kernel::config::load_config;
use wed_logger::ConsoleTarget;
use wed_server::Server;

#[wed_runtime::main(server)]
async fn main() -> anyhow::Result<()> {
    let cfg: ApiConfig =
        load_config(None::<&str>).context("Critical: Configuration is malformed")?;
    let _log = bootstrap::init_logger(env!("CARGO_PKG_NAME"), &cfg.logging, ConsoleTarget::Stdout)?;

    Server::builder().config(cfg).build().await?.run().await
}
