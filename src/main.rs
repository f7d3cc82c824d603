//! llamood is a CLI tool that summarizes an article with an LLM and classifies
//! its sentiment as positive, negative or neutral.
//!
//! The analysis and the token usage of the request are printed as JSON.
//! Credentials come from `OPENAI_API_KEY`, `OPENAI_ORG_ID` and
//! `OPENAI_PROJECT_ID`, or from the `[api]` section of the config file.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::{LevelFilter, info};

use llamood::{
    AnalyzerConfig, ArticleAnalyzer,
    constants::{DEFAULT_BASE_URL, DEFAULT_CONFIG_PATH, DEFAULT_MODEL, SAMPLE_ARTICLE},
};

/// A CLI tool to summarize an article and classify its sentiment using an LLM
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the article to analyze, a bundled sample article is used if omitted
    article: Option<PathBuf>,

    /// Path to the INI config file with an [api] section
    #[arg(long, short, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Chat model to use for the analysis
    #[arg(long, short, default_value = DEFAULT_MODEL)]
    model: String,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Path to the file with a prompt template
    #[arg(long, short = 'p')]
    prompt_file: Option<PathBuf>,

    #[arg(long, short, action = clap::ArgAction::Count, help = "Output v(v...)erbosity: error (0), warn (1), info (2), debug (3), trace (4)", default_value_t = 2)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            3 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .init();

    let article = match &cli.article {
        Some(path) => fs::read_to_string(path)
            .context(format!("Failed to read article: {}", path.display()))?,
        None => {
            info!("No article given, analyzing the bundled sample article");
            SAMPLE_ARTICLE.to_owned()
        }
    };

    let prompt_template = match &cli.prompt_file {
        Some(path) => Some(
            fs::read_to_string(path)
                .context(format!("Failed to read prompt file: {}", path.display()))?,
        ),
        None => None,
    };

    let config = AnalyzerConfig::load(&cli.config)?
        .with_model(&cli.model)
        .with_base_url(&cli.base_url)
        .with_prompt_template(prompt_template);

    let analyzer = ArticleAnalyzer::new(config)?;
    let (analysis, usage) = analyzer.analyze(&article).await?;

    println!("{}", serde_json::to_string_pretty(&analysis)?);
    println!("{}", serde_json::to_string_pretty(&usage)?);

    Ok(())
}
