//! relay CLI: send a message (optionally with a file) through the budgeted
//! completion client, extract a file's text, or list the model catalog.
//! Config comes from env (`OPENAI_API_KEY`, `OPENAI_API_BASE`, ...) and a
//! `.env` file when present.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use relay_llm::{AiClient, ClientConfig, ExtractorRegistry, ModelCatalog, ModelSelector};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Token-budgeted chat completions with file attachments", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a message and print the reply.
    Send {
        message: String,
        /// File whose text is appended to the message.
        #[arg(short, long)]
        file: Option<PathBuf>,
        #[arg(long)]
        max_tokens: Option<usize>,
        #[arg(short, long)]
        temperature: Option<f32>,
        /// Stream the completion (the reply is still printed once complete).
        #[arg(long)]
        stream: bool,
        #[arg(short, long, default_value = "openai")]
        provider: String,
        /// Overrides OPENAI_API_BASE.
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Print the text extracted from a file.
    Extract { file: PathBuf },
    /// List the model catalog in selection order.
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Send {
            message,
            file,
            max_tokens,
            temperature,
            stream,
            provider,
            base_url,
        } => {
            let mut config = ClientConfig::from_env().context("failed to load client config")?;
            if let Some(base_url) = base_url {
                config = config.with_base_url(base_url);
            }
            let client = AiClient::with_config(config, &provider)?;

            let mut options = client.default_options().clone().with_stream(stream);
            if let Some(max_tokens) = max_tokens {
                options = options.with_max_tokens(max_tokens);
            }
            if let Some(temperature) = temperature {
                options = options.with_temperature(temperature);
            }

            let reply = client
                .send_message(&message, &options, file.as_deref())
                .await?;
            println!("{}", reply);
        }
        Commands::Extract { file } => {
            let extracted = ExtractorRegistry::new()
                .extract(&file)
                .with_context(|| format!("failed to extract {}", file.display()))?;
            println!("{}", extracted.text);
        }
        Commands::Models => {
            let catalog = ModelCatalog::load()?;
            let selector = ModelSelector::new(&catalog)?;
            for model in selector.models() {
                println!("{:<24} {:>8}", model.name, model.max_context_tokens);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_send() {
        let cli = Cli::try_parse_from([
            "relay", "send", "hello", "--file", "notes.txt", "--max-tokens", "50",
        ])
        .unwrap();
        match cli.command {
            Commands::Send {
                message,
                file,
                max_tokens,
                provider,
                stream,
                ..
            } => {
                assert_eq!(message, "hello");
                assert_eq!(file, Some(PathBuf::from("notes.txt")));
                assert_eq!(max_tokens, Some(50));
                assert_eq!(provider, "openai");
                assert!(!stream);
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn test_parse_models() {
        let cli = Cli::try_parse_from(["relay", "models"]).unwrap();
        assert!(matches!(cli.command, Commands::Models));
    }
}
