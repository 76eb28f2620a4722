//! `insighter` binary entry point.

use document_insighter::cli::{AuthCommands, Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    let default_level = if cli.global.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let global = cli.global;
    let result = match cli.command {
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::Login(args) => {
                document_insighter::cli::auth::handle_login(&global, args.force).await
            }
            AuthCommands::Status => document_insighter::cli::auth::handle_status(&global).await,
        },
        Commands::Upload(args) => document_insighter::cli::documents::handle_upload(&global, args).await,
        Commands::Status(args) => document_insighter::cli::documents::handle_status(&global, args).await,
        Commands::Extractions(args) => {
            document_insighter::cli::documents::handle_extractions(&global, args).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
