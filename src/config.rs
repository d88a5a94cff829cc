use std::{env, net::SocketAddr};

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
    pub allowed_dirs: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("invalid bind address or port")]
    InvalidSocket,
    #[error("MCP_ALLOWED_DIRS is empty and the working directory is unavailable")]
    UnresolvedAllowedDirs,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let bind_port = env::var("BIND_PORT")
            .ok()
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8080);

        let allowed_dirs = env::var("MCP_ALLOWED_DIRS")
            .ok()
            .map(|value| {
                value
                    .split(':')
                    .map(str::trim)
                    .filter(|dir| !dir.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|dirs| !dirs.is_empty())
            .map_or_else(default_allowed_dirs, Ok)?;

        let config = Self {
            bind_addr,
            bind_port,
            allowed_dirs,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

fn default_allowed_dirs() -> Result<Vec<String>, ConfigError> {
    let cwd = env::current_dir().map_err(|_| ConfigError::UnresolvedAllowedDirs)?;
    Ok(vec![cwd.to_string_lossy().into_owned()])
}
