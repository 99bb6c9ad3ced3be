//! docsift command-line interface

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use docsift::core::mime::{extension_from_url, mime_from_extension};
use docsift::{BatchItem, ExtractionConfig, Summary, batch_extract_bytes, extract_bytes, get_format_registry};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Output format for `extract`
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Full summary as pretty-printed JSON
    Json,
    /// Title, description and links as plain text
    Text,
}

#[derive(Parser)]
#[command(name = "docsift")]
#[command(version, about = "Summarize crawled documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a local file
    Extract {
        /// File to summarize
        file: PathBuf,

        /// MIME type, as a server would send it (guessed from the extension when omitted)
        #[arg(short, long)]
        mime_type: Option<String>,

        /// URL the document was fetched from (defaults to a file:// URL)
        #[arg(short, long)]
        url: Option<Url>,

        /// Configuration file (TOML, YAML or JSON); docsift.toml is discovered otherwise
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Summarize several local files concurrently and print a JSON array
    Batch {
        /// Files to summarize
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Configuration file (TOML, YAML or JSON); docsift.toml is discovered otherwise
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List registered extractors with their MIME types and extensions
    Formats,
}

fn load_config(path: Option<&Path>) -> Result<ExtractionConfig> {
    match path {
        Some(path) => ExtractionConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(ExtractionConfig::discover()?.unwrap_or_default()),
    }
}

fn document_url(file: &Path, url: Option<Url>) -> Result<Url> {
    if let Some(url) = url {
        return Ok(url);
    }
    let absolute = std::fs::canonicalize(file).with_context(|| format!("Cannot resolve {}", file.display()))?;
    match Url::from_file_path(&absolute) {
        Ok(url) => Ok(url),
        Err(()) => bail!("Cannot build a URL for {}", absolute.display()),
    }
}

fn guess_mime_type(url: &Url) -> String {
    extension_from_url(url)
        .and_then(|ext| mime_from_extension(&ext))
        .unwrap_or_default()
}

fn print_text(summary: &Summary) {
    println!("Title:       {}", summary.title);
    println!("MIME type:   {}", summary.mime_type);
    if let Some(language) = &summary.language {
        println!("Language:    {}", language);
    }
    if !summary.authors.is_empty() {
        println!("Authors:     {}", summary.authors.join(", "));
    }
    if let Some(redirect) = &summary.location_redirect {
        println!("Redirect:    {}", redirect);
    }
    println!();
    println!("{}", summary.description);

    if !summary.links.is_empty() {
        println!();
        println!("Links ({}):", summary.links.len());
        for (url, text) in &summary.links {
            if text.is_empty() {
                println!("  {}", url);
            } else {
                println!("  {} - {}", url, text);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            file,
            mime_type,
            url,
            config,
            format,
        } => {
            let config = load_config(config.as_deref())?;
            let content = std::fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            let url = document_url(&file, url)?;
            let mime_type = mime_type.unwrap_or_else(|| guess_mime_type(&url));
            tracing::debug!(file = %file.display(), mime_type = %mime_type, "Extracting");

            let Some(summary) = extract_bytes(&content, &mime_type, &url, &config) else {
                bail!("{} is not a supported document", file.display());
            };

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                OutputFormat::Text => print_text(&summary),
            }
            Ok(())
        }

        Commands::Batch { files, config } => {
            let config = load_config(config.as_deref())?;
            let mut items = Vec::with_capacity(files.len());
            for file in &files {
                let content = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
                let url = document_url(file, None)?;
                let mime_type = guess_mime_type(&url);
                items.push(BatchItem::new(content, mime_type, url));
            }

            let summaries = batch_extract_bytes(items, &config).await?;
            for (file, summary) in files.iter().zip(&summaries) {
                if summary.is_none() {
                    tracing::warn!(file = %file.display(), "Not a supported document");
                }
            }
            println!("{}", serde_json::to_string_pretty(&summaries)?);
            Ok(())
        }

        Commands::Formats => {
            let registry = get_format_registry();
            for extractor in registry.extractors() {
                println!("{} (priority {})", extractor.name(), extractor.priority());
                println!("  MIME types: {}", extractor.supported_mime_types().join(", "));
                if !extractor.supported_extensions().is_empty() {
                    println!("  Extensions: {}", extractor.supported_extensions().join(", "));
                }
                if !extractor.supported_root_elements().is_empty() {
                    println!("  XML roots:  {}", extractor.supported_root_elements().join(", "));
                }
            }
            Ok(())
        }
    }
}
