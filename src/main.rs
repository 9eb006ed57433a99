use anyhow::Result;
use clap::Parser;

use unswtalk::cli::{Cli, Commands};
use unswtalk::config::{get_config, init_config};
use unswtalk::runtime::modes::run_server;
use unswtalk::system::init_logging;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_config();
    let config = get_config();

    match cli.command {
        None | Some(Commands::Serve) => {
            let _guard = init_logging(&config.logging)?;
            run_server().await
        }
        #[cfg(feature = "cli")]
        Some(command) => {
            if let Err(e) = unswtalk::interfaces::cli::run_cli_command(command).await {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
            Ok(())
        }
        #[cfg(not(feature = "cli"))]
        Some(_) => anyhow::bail!("this build has no operator commands; rebuild with --features cli"),
    }
}
