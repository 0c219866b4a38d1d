use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use docchat_client::{ChatClient, FileBackend};

mod cli;
mod repl;
mod view;

use cli::Cli;
use view::TerminalView;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Some(shell) = cli.generate {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        return Ok(());
    }

    init_logging(cli.verbose);

    let config = cli.client_config()?;
    let data_dir = cli.data_dir()?;
    log::info!("Keeping chat history in {}", data_dir.display());

    let client = ChatClient::native(config, TerminalView::stdout(), FileBackend::new(&data_dir))
        .context("Failed to start chat client")?;

    // The socket transport reconnects from local background tasks
    tokio::task::LocalSet::new()
        .run_until(repl::run_repl(&client))
        .await
}
