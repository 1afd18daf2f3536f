use crate::demo::{
    run_demo, run_migrate_other_data, run_templates, DemoArgs, MigrateArgs, TemplatesArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use workforce::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Workforce Forms",
    about = "Run and demonstrate the workforce form submission service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the built-in form template catalog
    Templates(TemplatesArgs),
    /// Walk a demo application through submit and retract
    Demo(DemoArgs),
    /// Backfill the cached profile snapshot on submissions that lack one
    MigrateOtherData(MigrateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Templates(args) => run_templates(args),
        Command::Demo(args) => run_demo(args).await,
        Command::MigrateOtherData(args) => run_migrate_other_data(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["workforce-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn serve_accepts_overrides() {
        let cli = Cli::try_parse_from(["workforce-api", "serve", "--port", "8080"]).expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, Some(8080));
                assert!(args.host.is_none());
            }
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn demo_flags_parse() {
        let cli = Cli::try_parse_from(["workforce-api", "demo", "--skip-profile-change"])
            .expect("parses");
        match cli.command {
            Some(Command::Demo(args)) => assert!(args.skip_profile_change),
            other => panic!("expected demo, got {other:?}"),
        }
    }

    #[test]
    fn migrate_other_data_parses_provider_override() {
        let cli = Cli::try_parse_from([
            "workforce-api",
            "migrate-other-data",
            "--provider-id",
            "legacy-provider",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::MigrateOtherData(args)) => {
                assert_eq!(args.provider_id.as_deref(), Some("legacy-provider"));
            }
            other => panic!("expected migrate-other-data, got {other:?}"),
        }
    }
}
