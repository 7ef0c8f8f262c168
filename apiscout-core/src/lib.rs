pub mod analyze;
pub mod config;
pub mod data;
pub mod discover;
pub mod extract;
pub mod inventory;
pub mod report;

use colored::Colorize;

const BANNER: &str = r#"
    _          _ ____                  _
   / \   _ __ (_) ___|  ___ ___  _   _| |_
  / _ \ | '_ \| \___ \ / __/ _ \| | | | __|
 / ___ \| |_) | |___) | (_| (_) | |_| | |_
/_/   \_\ .__/|_|____/ \___\___/ \__,_|\__|
        |_|
"#;

pub fn print_banner() {
    println!("{}", BANNER.bright_cyan());
    println!(
        "{} {}",
        "ApiScout".bright_white().bold(),
        env!("CARGO_PKG_VERSION").bright_black()
    );
    println!("{}\n", "Best-effort PSD2 open banking API discovery".bright_black());
}
