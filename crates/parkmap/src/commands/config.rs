use anyhow::Result;
use colored::Colorize;
use inquire::{Confirm, CustomType, Select, Text};

use crate::cli::ConfigCommands;
use crate::config::{Config, DEFAULT_SERVER_URL};

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => set(&key, &value),
        ConfigCommands::Init => init(),
    }
}

fn show() -> Result<()> {
    let path = Config::path()?;
    let config = Config::load_or_default();
    println!("{} {}", "Config file:".bold(), path.display());
    if !path.exists() {
        println!("{}", "(not created yet, showing defaults)".dimmed());
    }
    println!();
    println!("  server.url              {}", config.server_url(None));
    println!(
        "  server.poll_interval_ms {}",
        config.poll_interval().as_millis()
    );
    println!("  server.timeout_ms       {}", config.timeout().as_millis());
    println!("  defaults.theme          {}", config.theme_name());
    println!("  defaults.windowed       {}", config.windowed());
    match config.layout_path(None) {
        Some(path) => println!("  defaults.layout         {}", path.display()),
        None => println!("  defaults.layout         {}", "(built-in)".dimmed()),
    }
    Ok(())
}

fn set(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load_or_default();
    config.set(key, value)?;
    let path = config.save()?;
    println!(
        "{} {key} = {value} ({})",
        "Saved".green().bold(),
        path.display()
    );
    Ok(())
}

fn init() -> Result<()> {
    let mut config = Config::load_or_default();

    let url = Text::new("Parking server URL:")
        .with_default(&config.server_url(None))
        .prompt()?;
    config.set("server.url", url.trim())?;

    let interval: u64 = CustomType::new("Poll interval (ms):")
        .with_default(config.poll_interval().as_millis() as u64)
        .with_error_message("Please enter a whole number of milliseconds")
        .prompt()?;
    config.set("server.poll_interval_ms", &interval.to_string())?;

    let themes = vec!["light", "dark"];
    let start = usize::from(config.theme_name() == "dark");
    let theme = Select::new("Theme:", themes)
        .with_starting_cursor(start)
        .prompt()?;
    config.set("defaults.theme", theme)?;

    let windowed = Confirm::new("Open the map in a window (instead of fullscreen)?")
        .with_default(config.windowed())
        .prompt()?;
    config.set("defaults.windowed", if windowed { "true" } else { "false" })?;

    let path = config.save()?;
    println!();
    println!("{} {}", "Saved".green().bold(), path.display());
    if config.server_url(None) == DEFAULT_SERVER_URL {
        println!(
            "{}",
            "Using the local development server. Change it later with `parkmap config set server.url ...`."
                .dimmed()
        );
    }
    Ok(())
}
