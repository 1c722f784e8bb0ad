//! Profile subcommand handlers: the local TOML file, not the controller.

use std::fmt::Write as _;

use dialoguer::{Input, Select};
use secrecy::SecretString;

use apex_config::{Config, Profile};

use crate::cli::{GlobalOpts, ProfileArgs, ProfileCommand};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

// ── Helpers ─────────────────────────────────────────────────────────

const MASK: &str = "****";

/// Copy of the config with plaintext passwords masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some(MASK.into());
        }
    }
    cfg
}

/// Format config for display in TOML layout, profiles sorted by name.
fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "retries = {}", cfg.defaults.retries);
    let _ = writeln!(out, "retry_delay_ms = {}", cfg.defaults.retry_delay_ms);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let Some(p) = cfg.profiles.get(name) else {
            continue;
        };
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "host = \"{}\"", p.host);
        if let Some(ref u) = p.username {
            let _ = writeln!(out, "username = \"{u}\"");
        }
        if let Some(ref pw) = p.password {
            let _ = writeln!(out, "password = \"{pw}\"");
        }
        if let Some(ref env) = p.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(retries) = p.retries {
            let _ = writeln!(out, "retries = {retries}");
        }
        if let Some(delay) = p.retry_delay_ms {
            let _ = writeln!(out, "retry_delay_ms = {delay}");
        }
        if let Some(format) = p.legacy_format {
            let _ = writeln!(out, "legacy_format = \"{format}\"");
        }
    }

    out
}

fn available(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    names.sort();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

fn prompt_password() -> Result<SecretString, CliError> {
    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(password))
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ProfileArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ProfileCommand::Init => init(global),

        ProfileCommand::Show => {
            let cfg = redacted(&apex_config::load_config_or_default());
            let out = output::render_single(&global.output, &cfg, format_config, |c| {
                let mut names: Vec<_> = c.profiles.keys().cloned().collect();
                names.sort();
                names.join("\n")
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProfileCommand::SetPassword => {
            let cfg = apex_config::load_config_or_default();
            let name = cfg.profile_name(global.profile.as_deref()).to_owned();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: available(&cfg),
                    name,
                });
            }
            let password = prompt_password()?;
            apex_config::store_password(&name, &password)?;
            if !global.quiet {
                eprintln!("✓ Password for profile '{name}' stored in system keyring");
            }
            Ok(())
        }
    }
}

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let config_path = apex_config::config_path();
    eprintln!("apexctl profile setup");
    eprintln!("   Config path: {}\n", config_path.display());

    let name: String = Input::new()
        .with_prompt("Profile name")
        .default(global.profile.clone().unwrap_or_else(|| "default".into()))
        .interact_text()
        .map_err(prompt_err)?;

    let host: String = Input::new()
        .with_prompt("Controller address")
        .default(global.host.clone().unwrap_or_else(|| "192.168.1.50".into()))
        .validate_with(|input: &String| -> Result<(), String> {
            apex_config::parse_host(input)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)?;

    let username: String = Input::new()
        .with_prompt("Username")
        .default(global.username.clone().unwrap_or_else(|| "admin".into()))
        .interact_text()
        .map_err(prompt_err)?;

    let password = prompt_password()?;

    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let plaintext = if selection == 0 {
        apex_config::store_password(&name, &password)?;
        eprintln!("   ✓ Password stored in system keyring");
        None
    } else {
        Some(secrecy::ExposeSecret::expose_secret(&password).to_owned())
    };

    let mut cfg = apex_config::load_config_or_default();
    cfg.profiles.insert(
        name.clone(),
        Profile {
            host,
            username: (username != "admin").then_some(username),
            password: plaintext,
            ..Profile::default()
        },
    );
    if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
        cfg.default_profile = Some(name.clone());
    }
    apex_config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Profile: {name}");
    eprintln!("\n  Test it: apexctl status --profile {name}");
    Ok(())
}
