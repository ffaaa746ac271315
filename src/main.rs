use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod output;
mod tty;

use commands::{call, config, deploy, salts};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "cpdeploy")]
#[command(version = VERSION)]
#[command(about = "Provision WordPress (and optionally Elementor) sites on cPanel hosting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a WordPress site to a cPanel account
    Deploy(deploy::DeployArgs),
    /// Invoke a single cPanel UAPI function
    Call(call::CallArgs),
    /// Render a wp-config.php security key block
    Salts(salts::SaltsArgs),
    /// Manage global cpdeploy configuration
    Config(config::ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs {};

    let (json_result, exit_code) = commands::run_json(cli.command, &global);

    if output::print_result(json_result).is_err() {
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
