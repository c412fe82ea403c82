use clap::Parser;

use asupsort::cli::{Args, Commands};
use asupsort::commands::{handle_extract, handle_scan, prompt_root};
use asupsort::config::Config;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    // Load configuration
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match args.command {
        Commands::Scan { root } => {
            let root = match root {
                Some(r) => r,
                None => prompt_root(&config.ui.color.theme)?,
            };
            handle_scan(&root, &config).await?;
        }
        Commands::Extract { root } => {
            let root = match root {
                Some(r) => r,
                None => prompt_root(&config.ui.color.theme)?,
            };
            handle_extract(&root, args.quiet, &config).await?;
        }
    }

    if args.pause {
        println!("Press Enter to close...");
        console::Term::stdout().read_line()?;
    }

    Ok(())
}
