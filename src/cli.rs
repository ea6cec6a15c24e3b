use std::net::{IpAddr, SocketAddr};

use clap::{Args, Parser, Subcommand};

use crate::{
    error::{ServiceError, ServiceResult},
    metadata::{PKG_DESCRIPTION, PKG_NAME, PKG_VERSION},
};

#[derive(Parser, Debug, Clone)]
#[command(name = PKG_NAME)]
#[command(version = PKG_VERSION)]
#[command(about = PKG_DESCRIPTION, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Arguments used when no subcommand is given
    #[command(flatten)]
    pub start: CommandArguments,
}

impl Cli {
    /// Running without a subcommand starts the server.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Start(self.start))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the gateway server
    Start(CommandArguments),
    /// Print version information
    Version,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CommandArguments {
    /// Address to bind (IP literal)
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, short, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Seconds allowed for reading request headers and body
    #[arg(long, env = "GATEWAY_READ_TIMEOUT_SECS", default_value_t = 10)]
    pub read_timeout_secs: u64,

    /// Seconds to wait for in-flight connections after a shutdown signal
    #[arg(long, env = "GATEWAY_SHUTDOWN_TIMEOUT_SECS", default_value_t = 30)]
    pub shutdown_timeout_secs: u64,
}

impl Default for CommandArguments {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            read_timeout_secs: 10,
            shutdown_timeout_secs: 30,
        }
    }
}

impl CommandArguments {
    pub fn socket_addr(&self) -> ServiceResult<SocketAddr> {
        let ip = self.host.trim().parse::<IpAddr>().map_err(|e| {
            ServiceError::InvalidConfig(format!("Invalid HOST '{}': {e}", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Validate CLI/environment-derived arguments.
    pub fn validate(&self) -> ServiceResult<()> {
        self.socket_addr()?;
        if self.read_timeout_secs == 0 {
            return Err(ServiceError::InvalidConfig(
                "GATEWAY_READ_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        if self.shutdown_timeout_secs == 0 {
            return Err(ServiceError::InvalidConfig(
                "GATEWAY_SHUTDOWN_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
