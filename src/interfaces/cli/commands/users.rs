//! `reset-password` and `verify-user`

use std::io::{self, BufRead, IsTerminal, Write};

use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::services::AppServices;
use crate::services::accounts::validate_password;

fn read_password(password: Option<String>, stdin: bool) -> Result<String, CliError> {
    if stdin {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| CliError::CommandError(format!("Failed to read from stdin: {}", e)))?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    } else if let Some(password) = password {
        Ok(password)
    } else {
        prompt_password_with_confirm()
    }
}

fn prompt_password_with_confirm() -> Result<String, CliError> {
    if !io::stdin().is_terminal() {
        return Err(CliError::CommandError(
            "No password provided. Use --password or --stdin, or run interactively.".to_string(),
        ));
    }

    let prompt = |label: &str| -> Result<String, CliError> {
        print!("{}", label);
        io::stdout()
            .flush()
            .map_err(|e| CliError::CommandError(e.to_string()))?;
        rpassword::read_password()
            .map_err(|e| CliError::CommandError(format!("Failed to read password: {}", e)))
    };

    let password = prompt("Enter new password: ")?;
    let confirm = prompt("Confirm password: ")?;
    if password != confirm {
        return Err(CliError::ParseError("Passwords do not match".to_string()));
    }
    Ok(password)
}

pub async fn reset_password(
    services: &AppServices,
    z_id: &str,
    password: Option<String>,
    stdin: bool,
) -> Result<(), CliError> {
    let password = read_password(password, stdin)?;
    validate_password(&password)?;

    services.accounts.set_password(z_id, &password).await?;
    println!(
        "{} Password reset for {}",
        "✓".green().bold(),
        z_id.cyan()
    );
    Ok(())
}

pub async fn verify_user(services: &AppServices, z_id: &str) -> Result<(), CliError> {
    services.accounts.mark_verified(z_id).await?;
    println!("{} {} is verified", "✓".green().bold(), z_id.cyan());
    Ok(())
}
