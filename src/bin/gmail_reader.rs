use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

use gmail_reader::auth::{CredentialProvider, StaticToken, token_manager::TokenManager, token_store};
use gmail_reader::config::{Config, load_config, load_config_from, load_optional_config};
use gmail_reader::{FetchOptions, GmailReader};

#[derive(Parser)]
#[command(name = "gmail_reader")]
#[command(about = "Read Gmail messages as plain-text documents", long_about = None)]
struct Cli {
    /// Config file (defaults to the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch messages and print one JSON document per line
    Fetch {
        /// Gmail search query, e.g. "from:me after:2023-01-01"
        #[arg(long, short)]
        query: Option<String>,

        /// Desired number of messages (default 10)
        #[arg(long)]
        max_results: Option<usize>,

        /// Page size for list requests (defaults to max-results)
        #[arg(long)]
        results_per_page: Option<usize>,

        /// Use this bearer token instead of the OAuth flow
        #[arg(long, env = "GMAIL_ACCESS_TOKEN", hide_env_values = true)]
        access_token: Option<String>,
    },

    /// Run the browser consent flow and cache the tokens
    Login,

    /// Store the OAuth client secret in keyring
    SetClientSecret {
        #[arg(long)]
        client_id: String,
    },
}

fn read_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(p) => load_config_from(p),
        None => load_config(),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::SetClientSecret { client_id } => {
            eprintln!("Paste client secret (end with Ctrl-D):");
            let mut secret = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut secret)?;
            token_store::save_client_secret(&client_id, secret.trim())?;
            println!("Saved client secret for client_id {}", client_id);
            Ok(())
        }

        Command::Login => {
            let cfg = read_config(cli.config.as_ref())
                .map_err(|e| anyhow!("Configuration error: {e}"))?;
            TokenManager::from_config(&cfg)?.login()?;
            println!("Login complete; tokens cached.");
            Ok(())
        }

        Command::Fetch {
            query,
            max_results,
            results_per_page,
            access_token,
        } => {
            // a bearer token needs no OAuth settings, so the config may be absent
            let (cfg, credentials): (Option<Config>, Box<dyn CredentialProvider>) =
                match access_token {
                    Some(t) => (
                        load_optional_config(cli.config.as_deref())
                            .map_err(|e| anyhow!("Configuration error: {e:#}"))?,
                        Box::new(StaticToken(t)) as Box<dyn CredentialProvider>,
                    ),
                    None => {
                        let cfg = read_config(cli.config.as_ref())
                            .map_err(|e| anyhow!("Configuration error: {e}"))?;
                        let manager = TokenManager::from_config(&cfg)?;
                        (Some(cfg), Box::new(manager) as Box<dyn CredentialProvider>)
                    }
                };

            let mut reader = cfg
                .as_ref()
                .map(GmailReader::from_config)
                .unwrap_or_else(|| GmailReader::new(FetchOptions::default()));
            if query.is_some() {
                reader.options.query = query;
            }
            if let Some(n) = max_results {
                reader.options.max_results = n;
            }
            if results_per_page.is_some() {
                reader.options.results_per_page = results_per_page;
            }

            let docs = reader.load_data(credentials)?;

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for doc in &docs {
                serde_json::to_writer(&mut out, doc)?;
                writeln!(out)?;
            }
            Ok(())
        }
    }
}
