pub mod completion;
pub mod config;
pub mod script;

use colored::Colorize;

pub fn print_version() {
    println!(
        "{} {}",
        "picturestory".bold(),
        env!("CARGO_PKG_VERSION").green()
    );
    println!("{}", env!("CARGO_PKG_DESCRIPTION").dimmed());
}
