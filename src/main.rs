use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    let cli = shelfscan::cli::Cli::parse();
    shelfscan::logging::init(cli.verbose).context("init logging")?;
    tracing::debug!(?cli, "parsed cli");

    let data_dir = shelfscan::config::data_dir(cli.data_dir.as_deref());

    match cli.command {
        shelfscan::cli::Command::Book { command } => {
            shelfscan::library::book(&data_dir, command).context("book")?;
        }
        shelfscan::cli::Command::Shelf { command } => {
            shelfscan::library::shelf(&data_dir, command).context("shelf")?;
        }
        shelfscan::cli::Command::Scan(args) => {
            shelfscan::scan::run(&data_dir, args).await.context("scan")?;
        }
        shelfscan::cli::Command::Batch(args) => {
            shelfscan::batch::run(&data_dir, args)
                .await
                .context("batch")?;
        }
        shelfscan::cli::Command::Export(args) => {
            shelfscan::export::run(&data_dir, args).context("export")?;
        }
        shelfscan::cli::Command::Stats(args) => {
            shelfscan::library::stats(&data_dir, args).context("stats")?;
        }
    }

    Ok(())
}
