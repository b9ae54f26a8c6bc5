use console::style;
use dialoguer::{Confirm, Input, Password};

use crate::config::AppConfig;
use crate::error::Result;

pub async fn execute() -> Result<()> {
    println!("{}", style("Welcome to sshcli!").bold().cyan());
    println!("Let's configure the remote host.\n");

    let defaults = AppConfig::load().unwrap_or_default();

    let hostname: String = Input::new()
        .with_prompt("Remote host")
        .with_initial_text(defaults.hostname.clone().unwrap_or_default())
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("SSH port")
        .default(defaults.port)
        .interact_text()?;

    let username: String = Input::new()
        .with_prompt("Remote user")
        .default(defaults.username.clone())
        .interact_text()?;

    let key_path: String = Input::new()
        .with_prompt("SSH private key path (empty to use the agent only)")
        .allow_empty(true)
        .default(defaults.key_path.clone().unwrap_or_default())
        .interact_text()?;

    let store_password = Confirm::new()
        .with_prompt("Store a password in the config file? (plain text)")
        .default(false)
        .interact()?;

    let password = if store_password {
        Some(
            Password::new()
                .with_prompt("SSH password")
                .with_confirmation("Confirm password", "Passwords do not match")
                .interact()?,
        )
    } else {
        None
    };

    let config = AppConfig {
        hostname: Some(hostname),
        port,
        username,
        password,
        key_path: if key_path.is_empty() {
            None
        } else {
            Some(shellexpand::tilde(&key_path).to_string())
        },
    };

    config.validate()?;
    config.save()?;

    println!("\n{}", style("✓ Configuration saved!").green().bold());
    println!(
        "Config file: {}",
        style(AppConfig::config_path()?.display()).dim()
    );
    println!(
        "\nRun {} to check the connection.",
        style("sshcli cwd").cyan()
    );

    Ok(())
}
