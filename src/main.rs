// Trading ecosystem logging runtime - main.rs
// Bootstrap: configuration, tracing, then the requested command

use std::process::exit;

use clap::Parser;
use ecosystem_log::cli::{run, Cli};
use ecosystem_log::config_loader::load_config;
use ecosystem_log::telemetry::init_tracing;
use ecosystem_log::ConfigProvider;

fn main() {
    let cli = Cli::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ failed to load configuration: {e}");
            exit(1);
        }
    };

    if let Err(e) = init_tracing(&config) {
        eprintln!("Failed to initialize tracing: {e}");
    }

    // reports its handle decision through tracing
    let provider = ConfigProvider::new(config);

    if let Err(e) = run(cli, &provider) {
        eprintln!("❌ {e:#}");
        exit(1);
    }
}
