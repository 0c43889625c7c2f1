use clap::{Parser, Subcommand};
use flatsite::{config, media, output, server, store};
use rand::RngCore;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flatsite")]
#[command(about = "Flat-file personal website server")]
#[command(long_about = "\
Flat-file personal website server

Your filesystem is the data source. A flat content directory holds the
pages, a media directory holds uploaded images, and the git repository
around them provides history.

Content structure:

  ./
  ├── config.toml              # Site config (optional, all keys defaulted)
  ├── content/                 # One file per page
  │   ├── my-page.md           # Markdown → rendered at /content/md/my-page.md
  │   ├── about.html           # HTML → served at /content/about.html
  │   └── widget.js            # Script → served at /content/widget.js
  ├── media/                   # Uploaded images → served at /media/
  └── assets/                  # Static assets → served at /assets/ (optional)

Display names come from an in-file marker, checked in this order:
  1. <!-- content-name: My Page -->
  2. // content-name: widget
  3. title: My Page            (first lines only)
  4. filename fallback         (my-page.md → \"my page\")

Run 'flatsite gen-config' for a documented config.toml and
'flatsite gen-token' for a fresh editor secret.")]
#[command(version)]
struct Cli {
    /// Path to the config file
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the website server
    Serve,
    /// Scan the content and media directories and print an inventory
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
    /// Generate a refresh token for the editor
    GenToken,
    /// Copy a local image into the media directory
    AddImage {
        /// Image file to ingest
        path: PathBuf,
        /// Alt text for the generated snippets
        alt: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve => {
            let config = config::load_config(&cli.config)?;
            server::serve(config).await?;
        }
        Command::Check => {
            let config = config::load_config(&cli.config)?;
            println!("==> Checking {}", config.content_dir.display());
            let items = store::ContentStore::new(&config.content_dir).list_items()?;
            let assets = media::MediaStore::new(&config.media_dir).list_assets()?;
            output::print_inventory(&items, &assets);
            if config.auth.refresh_token.is_none() {
                println!();
                println!("Note: no refresh token configured; the editor API is locked.");
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::GenToken => {
            println!("{}", generate_token());
            eprintln!();
            eprintln!("Put this in config.toml under [auth] refresh_token,");
            eprintln!("or export it as REFRESH_TOKEN.");
        }
        Command::AddImage { path, alt } => {
            let config = config::load_config(&cli.config)?;
            let stored =
                media::MediaStore::new(&config.media_dir).import_file(&path, alt.as_deref())?;
            println!("Saved: {}", stored.filename);
            println!("URL: {}", stored.url);
            println!();
            println!("Markdown:");
            println!("{}", stored.markdown);
            println!();
            println!("HTML:");
            println!("{}", stored.html);
        }
    }

    Ok(())
}

/// 32 random bytes, hex-encoded — the shared editor secret.
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
