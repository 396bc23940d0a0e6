use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    serialstats::logging::init().context("init logging")?;

    let cli = serialstats::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        serialstats::cli::Command::Save(args) => {
            serialstats::save::run(args).context("save")?;
        }
        serialstats::cli::Command::Verify(args) => {
            serialstats::persist::run(args).context("verify")?;
        }
    }

    Ok(())
}
