use console::style;

use crate::config::AppConfig;
use crate::error::{Result, SshCliError};

pub async fn show() -> Result<()> {
    let config_path = AppConfig::config_path()?;

    if !config_path.exists() {
        println!("{}", style("No configuration found.").dim());
        println!("Run {} to create one.", style("sshcli init").cyan());
        return Ok(());
    }

    let config = AppConfig::load()?;

    println!("{}", style("Current Configuration").bold().cyan());
    println!();
    print!("  Host:     ");
    match &config.hostname {
        Some(h) => println!("{}", style(h).white()),
        None => println!("{}", style("(none)").dim()),
    }
    println!("  Port:     {}", style(config.port).white());
    println!("  User:     {}", style(&config.username).white());
    println!(
        "  Password: {}",
        if config.password.is_some() {
            style("stored").yellow()
        } else {
            style("(none)").dim()
        }
    );
    print!("  SSH key:  ");
    match &config.key_path {
        Some(k) => println!("{}", style(k).dim()),
        None => println!("{}", style("(agent, then ~/.ssh/id_ed25519)").dim()),
    }
    println!();
    println!("Config file: {}", style(config_path.display()).dim());

    Ok(())
}

pub async fn set(key: String, value: String) -> Result<()> {
    let mut config = AppConfig::load().unwrap_or_default();

    if let Err(e) = apply(&mut config, &key, &value) {
        println!("{} {}", style("!").yellow().bold(), e);
        println!("\nAvailable keys:");
        println!("  host, port, user, password, key");
        return Ok(());
    }

    config.save()?;

    let shown = if key == "password" { "***" } else { value.as_str() };
    println!(
        "{} Set {} = {}",
        style("✓").green().bold(),
        style(&key).cyan(),
        style(shown).white()
    );

    Ok(())
}

fn apply(config: &mut AppConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "host" | "hostname" => config.hostname = Some(value.to_string()),
        "port" => {
            config.port = value
                .parse()
                .map_err(|_| SshCliError::Config(format!("Invalid port: {}", value)))?;
        }
        "user" | "username" => config.username = value.to_string(),
        "password" => config.password = Some(value.to_string()).filter(|v| !v.is_empty()),
        "key" | "key_path" | "key-path" => config.key_path = Some(value.to_string()),
        _ => {
            return Err(SshCliError::Config(format!(
                "Unknown config key: {}",
                key
            )))
        }
    }

    Ok(())
}

pub async fn edit() -> Result<()> {
    let config_path = AppConfig::config_path()?;

    if !config_path.exists() {
        println!("{}", style("No configuration found.").dim());
        println!("Run {} to create one.", style("sshcli init").cyan());
        return Ok(());
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

    std::process::Command::new(&editor)
        .arg(&config_path)
        .status()?;

    Ok(())
}
