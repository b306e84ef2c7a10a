use anyhow::Context;
use git_clone_rs::config::{DEFAULT_LOG_FILTER, LOG_FILTER_ENV};
use git_clone_rs::Command;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    if let Err(err) = run(&args[1..]).await {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: &[String]) -> anyhow::Result<()> {
    let cmd = Command::new(args).context("cannot parse command line")?;
    cmd.run().await?;
    Ok(())
}
