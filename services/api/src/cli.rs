use crate::commands::{run_sync, run_update_status, SyncArgs, UpdateStatusArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use talent_relay::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Talent Relay",
    about = "Relay ATS candidates, jobs and applications to the analysis service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the analysis HTTP service (default command)
    Serve(ServeArgs),
    /// Pull one ATS, write its canonical batch and forward it for analysis
    Sync(SyncArgs),
    /// Move a BambooHR application to another pipeline status
    UpdateStatus(UpdateStatusArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Push proposed statuses for BambooHR applications after each analysis
    #[arg(long)]
    pub(crate) apply_status_updates: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Sync(args) => run_sync(args).await,
        Command::UpdateStatus(args) => run_update_status(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sync_with_overrides() {
        let cli = Cli::try_parse_from([
            "talent-relay",
            "sync",
            "workable",
            "--output-dir",
            "/tmp/relay",
        ])
        .expect("sync parses");
        match cli.command {
            Some(Command::Sync(args)) => {
                assert_eq!(args.source, "workable");
                assert_eq!(
                    args.output_dir.as_deref(),
                    Some(std::path::Path::new("/tmp/relay"))
                );
                assert!(args.analysis_url.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_update_status_positionals() {
        let cli = Cli::try_parse_from(["talent-relay", "update-status", "901", "3"])
            .expect("update-status parses");
        match cli.command {
            Some(Command::UpdateStatus(args)) => {
                assert_eq!(args.application_id, 901);
                assert_eq!(args.status_id, 3);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn update_status_refuses_non_numeric_ids_and_zero_status() {
        for argv in [
            ["talent-relay", "update-status", "../../employees/5", "3"],
            ["talent-relay", "update-status", "901", "0"],
            ["talent-relay", "update-status", "901", "new"],
        ] {
            assert!(Cli::try_parse_from(argv).is_err(), "{argv:?}");
        }
    }

    #[test]
    fn serve_is_the_default() {
        let cli = Cli::try_parse_from(["talent-relay"]).expect("empty args parse");
        assert!(cli.command.is_none());
    }
}
