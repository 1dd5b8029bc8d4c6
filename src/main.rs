// Copyright 2025 dentsusoken
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use tunnel_binary::commands::clean::CleanCommand;
use tunnel_binary::commands::ensure::EnsureCommand;
use tunnel_binary::commands::status::StatusCommand;
use tunnel_binary::config::TunnelConfig;
use tunnel_binary::error::{
    Result, TunnelError, format_error_chain, format_error_with_color, get_exit_code,
};
use tunnel_binary::logging;

#[derive(Parser)]
#[command(name = "tunnel-binary")]
#[command(
    author,
    version,
    about = "Keeps the tunnel binary present and current",
    long_about = None
)]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Read configuration from this TOML file instead of the default location
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Make sure the tunnel binary is present and current, then print its path
    Ensure {
        /// Remote manifest URL or file path
        #[arg(long, value_name = "SOURCE")]
        remote_manifest: Option<String>,

        /// HTTP proxy host
        #[arg(long, requires = "proxy_port")]
        proxy_host: Option<String>,

        /// HTTP proxy port
        #[arg(long, requires = "proxy_host")]
        proxy_port: Option<u16>,

        /// Maximum number of download cycles
        #[arg(long, value_name = "N")]
        max_attempts: Option<u32>,

        /// Download timeout in seconds
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,

        /// Disable progress indicators
        #[arg(long)]
        no_progress: bool,
    },

    /// Show where the binary lives and whether it needs a refresh
    Status {
        /// Remote manifest URL or file path
        #[arg(long, value_name = "SOURCE")]
        remote_manifest: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Remove staged binaries
    Clean {
        /// Also delete the local manifest
        #[arg(long)]
        manifest: bool,
    },
}

fn setup_logger(cli: &Cli) {
    logging::setup_logger(cli.verbose);
}

fn exit_with(error: &TunnelError) -> ! {
    let stderr = std::io::stderr();
    if stderr.is_terminal() {
        eprint!("{}", format_error_with_color(error, true));
    } else {
        eprintln!("{}", format_error_chain(error));
    }
    std::process::exit(get_exit_code(error));
}

fn main() {
    let cli = Cli::parse();

    setup_logger(&cli);

    let mut config = match TunnelConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    let result: Result<()> = (|| {
        match cli.command {
            Commands::Ensure {
                remote_manifest,
                proxy_host,
                proxy_port,
                max_attempts,
                timeout,
                no_progress,
            } => {
                if proxy_host.is_some() {
                    config.proxy.host = proxy_host;
                    config.proxy.port = proxy_port;
                }
                if let Some(max_attempts) = max_attempts {
                    config.max_attempts = max_attempts;
                }
                if timeout.is_some() {
                    config.timeout_secs = timeout;
                }
                config.no_progress |= no_progress;
                config.validate()?;

                let command = EnsureCommand::new(&config)?;
                command.execute(remote_manifest.as_deref())
            }
            Commands::Status {
                remote_manifest,
                json,
            } => {
                let command = StatusCommand::new(&config)?;
                command.execute(remote_manifest.as_deref(), json)
            }
            Commands::Clean { manifest } => {
                let command = CleanCommand::new(&config)?;
                command.execute(manifest)
            }
        }
    })();

    if let Err(e) = result {
        exit_with(&e);
    }
}
