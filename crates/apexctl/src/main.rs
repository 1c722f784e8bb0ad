mod cli;
mod commands;
mod error;
mod output;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use apex_core::{Controller, ControllerConfig};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Profile commands edit the local config file only
        Command::Profile(args) => commands::profile::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "apexctl", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let controller_config = build_controller_config(&cli.global)?;
            let mut controller = Controller::new(controller_config)?;
            controller.connect().await?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &mut controller, &cli.global).await
        }
    }
}

/// Build a `ControllerConfig` from the config file, profile, and CLI overrides.
///
/// Without a matching profile, `--host` alone is enough; the password then
/// comes from `APEX_PASSWORD` or the keyring entry of the named profile.
fn build_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let cfg = apex_config::load_config()?;
    let profile_name = cfg.profile_name(global.profile.as_deref()).to_owned();

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None => {
            let Some(host) = global.host.clone() else {
                if global.profile.is_some() {
                    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
                    names.sort();
                    return Err(CliError::ProfileNotFound {
                        name: profile_name,
                        available: if names.is_empty() {
                            "(none)".into()
                        } else {
                            names.join(", ")
                        },
                    });
                }
                return Err(CliError::NoConfig {
                    path: apex_config::config_path().display().to_string(),
                });
            };
            apex_config::Profile {
                host,
                ..apex_config::Profile::default()
            }
        }
    };

    let mut config =
        apex_config::profile_to_controller_config(&profile, &profile_name, &cfg.defaults)?;

    if let Some(ref host) = global.host {
        config.url = apex_config::parse_host(host)?;
    }
    if let Some(ref username) = global.username {
        config.username.clone_from(username);
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    Ok(config)
}
