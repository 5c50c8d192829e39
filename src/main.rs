use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use keyshard::cli::commands;
use keyshard::cli::output;
use keyshard::cli::{Cli, Commands};
use keyshard::errors::VaultError;

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is reserved for secrets and names.
    let filter = EnvFilter::try_from_env("KEYSHARD_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("keyshard=debug")
        } else {
            EnvFilter::new("keyshard=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let result = match cli.command {
        Commands::Init {
            ref address,
            ref encryption_key,
            asymmetric,
        } => commands::init::execute(
            &cli,
            address.as_deref(),
            encryption_key.as_deref(),
            asymmetric,
        ),
        Commands::Insert {
            ref name,
            force,
            multiline,
        } => commands::insert::execute(&cli, name, force, multiline),
        Commands::Edit {
            ref name,
            multiline,
        } => commands::edit::execute(&cli, name, multiline),
        Commands::Generate {
            ref name,
            force,
            policy,
        } => commands::generate::execute(&cli, name, force, &policy.policy()),
        Commands::Pwgen { count, policy } => commands::pwgen::execute(count, &policy.policy()),
        Commands::Get { ref name } => commands::get::execute(&cli, name),
        Commands::List { ref prefix } => commands::list::execute(&cli, prefix.as_deref()),
        Commands::Find { ref pattern } => commands::find::execute(&cli, pattern),
        Commands::Grep { ref pattern } => commands::grep::execute(&cli, pattern),
        Commands::Delete { ref name, force } => commands::delete::execute(&cli, name, force),
        Commands::Move {
            ref from,
            ref to,
            force,
        } => commands::move_cmd::execute(&cli, from, to, force),
        Commands::Copy {
            ref from,
            ref to,
            force,
        } => commands::copy::execute(&cli, from, to, force),
        Commands::Rotate {
            force,
            ref encryption_key,
            asymmetric,
        } => commands::rotate::execute(&cli, force, encryption_key.as_deref(), asymmetric),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        match e {
            VaultError::ConfigNotFound(_) => output::tip("Create the vault first: keyshard init"),
            VaultError::AlreadyExists(_) => output::tip("Pass --force to overwrite it"),
            VaultError::AuthenticationFailure => {
                output::tip("The key material in the config record does not open this vault")
            }
            _ => {}
        }
        std::process::exit(1);
    }
}
