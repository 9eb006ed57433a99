//! 针对配置的数据库执行的运维命令

pub mod commands;

use std::fmt;
use std::sync::Arc;

use crate::cli::{Commands, ConfigCommands};
use crate::services::AppServices;
use crate::storage::StorageFactory;

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    ParseError(String),
    CommandError(String),
}

impl CliError {
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<crate::errors::TalkError> for CliError {
    fn from(err: crate::errors::TalkError) -> Self {
        match err {
            crate::errors::TalkError::DatabaseConfig(_)
            | crate::errors::TalkError::DatabaseConnection(_)
            | crate::errors::TalkError::DatabaseOperation(_) => {
                CliError::StorageError(err.message().to_string())
            }
            crate::errors::TalkError::Validation(_) => {
                CliError::ParseError(err.message().to_string())
            }
            _ => CliError::CommandError(err.message().to_string()),
        }
    }
}

async fn open_services() -> Result<AppServices, CliError> {
    let storage = StorageFactory::create()
        .await
        .map_err(|e| CliError::StorageError(e.to_string()))?;
    Ok(AppServices::from_config(Arc::clone(&storage)))
}

/// 执行 clap 解析出的非服务器命令
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    match cmd {
        Commands::Config {
            action: ConfigCommands::Generate { output_path, force },
        } => commands::config_generate(output_path, force).await,
        Commands::ResetPassword {
            z_id,
            password,
            stdin,
        } => {
            let services = open_services().await?;
            commands::reset_password(&services, &z_id, password, stdin).await
        }
        Commands::VerifyUser { z_id } => {
            let services = open_services().await?;
            commands::verify_user(&services, &z_id).await
        }
        Commands::Serve => Err(CliError::CommandError(
            "serve is handled by the server runtime".to_string(),
        )),
    }
}
