use anyhow::Result;
use colored::Colorize;

use crate::cli::ConfigCommands;
use crate::config::Config;
use crate::widget::ImageSettings;

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => set(&key, &value),
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
    println!("{}", "Effective settings:".bold());
    println!("  defaults.theme: {}", config.theme());
    println!(
        "  defaults.reading_mode: {}",
        config.reading_mode().display_name()
    );
    println!("  defaults.scroll_speed: {}", config.scroll_speed());
    println!("  defaults.font_size: {}", config.font_size());
    println!(
        "  defaults.font_family: {}",
        config.font_family().display_name()
    );
    match config.slideshow_interval() {
        Some(secs) => println!("  defaults.slideshow_interval: {secs}"),
        None => println!(
            "  defaults.slideshow_interval: {}",
            format!("{} (built-in)", ImageSettings::default().interval).dimmed()
        ),
    }
    println!(
        "  defaults.inactivity_delay: {}",
        config.inactivity_delay().as_secs()
    );

    if config.defaults.is_some() {
        println!();
        println!("{}", "Stored YAML:".bold());
        print!("{}", serde_yaml::to_string(&config)?);
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
