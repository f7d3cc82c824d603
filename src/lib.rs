//! The llamood library sends article text to an OpenAI-compatible chat API and
//! gets back a structured summary with a sentiment label, together with the
//! token usage of the request.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod analyze;
pub mod config;
pub mod constants;
pub mod error;

/// Tone of an article. Decoding accepts exactly the three lowercase labels.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Self::Positive, Self::Negative, Self::Neutral];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a label case-insensitively, unlike the strict serde decoding.
impl std::str::FromStr for Sentiment {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            _ => Err(format!("Invalid sentiment: {}", input)),
        }
    }
}

/// Summary and sentiment produced by the model for one article.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ArticleAnalysis {
    /// Summary of the article, around 200 words
    pub summary: String,
    pub sentiment: Sentiment,
}

/// Tokens billed for a single analysis request.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct UsageReport {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

pub use analyze::{ArticleAnalyzer, analyze, render_prompt};
pub use config::{AnalyzerConfig, Credentials};
pub use error::AnalyzeError;
