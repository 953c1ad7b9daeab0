use clap::Parser;
use securedata::cli::commands;
use securedata::cli::commands::add_account::NewAccount;
use securedata::cli::commands::edit::Changes;
use securedata::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

/// Environment variable controlling log verbosity (e.g. `debug`).
const LOG_ENV: &str = "SECUREDATA_LOG";

fn main() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { ref login } => commands::init::execute(&cli, login),
        Commands::AddFolder {
            ref name,
            ref description,
            parent,
        } => commands::add_folder::execute(&cli, name, description.as_deref(), parent),
        Commands::AddAccount {
            ref name,
            ref description,
            parent,
            ref username,
            ref password,
        } => commands::add_account::execute(
            &cli,
            &NewAccount {
                name,
                description: description.as_deref(),
                parent,
                username: username.as_deref(),
                password: password.as_deref(),
            },
        ),
        Commands::List { json } => commands::list::execute(&cli, json),
        Commands::Show { id } => commands::show::execute(&cli, id),
        Commands::Edit {
            id,
            ref name,
            ref description,
            ref username,
            ref password,
            parent,
        } => commands::edit::execute(
            &cli,
            id,
            &Changes {
                name: name.as_deref(),
                description: description.as_deref(),
                username: username.as_deref(),
                password: password.as_deref(),
                parent,
            },
        ),
        Commands::Delete { id, force } => commands::delete::execute(&cli, id, force),
        Commands::Encrypt { id } => commands::encrypt::execute(&cli, id),
        Commands::Decrypt { id } => commands::decrypt::execute(&cli, id),
        Commands::Version => commands::version::execute(),
        Commands::Completions { ref shell } => commands::completions::execute(shell),
        Commands::Audit { last, ref since } => {
            commands::audit_cmd::execute(&cli, last, since.as_deref())
        }
    };

    if let Err(e) = result {
        securedata::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
