//! The analyze module sends one article to a chat completion endpoint with a
//! declared `ArticleAnalysis` JSON schema and decodes the structured answer
//! together with its token usage.

use log::{debug, info};
use once_cell::sync::Lazy;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;

use crate::config::{AnalyzerConfig, Credentials};
use crate::constants::{
    API_KEY_ENV_NAME, DEFAULT_PROMPT_TEMPLATE, ORG_ID_ENV_NAME, PROJECT_ID_ENV_NAME,
    RESPONSE_FORMAT_NAME, SYSTEM_PROMPT,
};
use crate::error::{AnalyzeError, Result};
use crate::{ArticleAnalysis, UsageReport};

static RESPONSE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "summary": {
                "type": "string",
                "description": "Summary of the article (around 200 words)"
            },
            "sentiment": {
                "type": "string",
                "enum": ["positive", "negative", "neutral"],
                "description": "Sentiment analysis result"
            }
        },
        "required": ["summary", "sentiment"],
        "additionalProperties": false
    })
});

const ORGANIZATION_HEADER: &str = "openai-organization";
const PROJECT_HEADER: &str = "openai-project";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Serialize)]
struct JsonSchemaFormat {
    name: &'static str,
    strict: bool,
    schema: &'static Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Analyzes articles against a single configured endpoint.
///
/// Calls are independent of each other, so one analyzer can be shared
/// between concurrent tasks.
#[derive(Debug)]
pub struct ArticleAnalyzer {
    config: AnalyzerConfig,
    endpoint: Url,
    client: Client,
}

impl ArticleAnalyzer {
    /// Creates an analyzer, checking the configuration up front so that a bad
    /// setup fails before any request is made.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * A credential is blank or not usable as an HTTP header value
    /// * The base URL is invalid
    /// * The HTTP client fails to build
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.credentials.validate()?;
        let endpoint = config.endpoint()?;
        let client = Client::builder()
            .default_headers(auth_headers(&config.credentials)?)
            .build()?;

        Ok(Self {
            config,
            endpoint,
            client,
        })
    }

    /// Summarizes an article and classifies its sentiment with one request.
    ///
    /// # Arguments
    ///
    /// * `article_content` - Article text, markup is passed through as is
    ///
    /// # Returns
    ///
    /// Returns the decoded analysis paired with the usage of the request
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The request cannot be delivered or its response cannot be read
    /// * The endpoint rejects the credentials or throttles the request
    /// * The endpoint answers with any other non-success status
    /// * The response does not decode into [`ArticleAnalysis`] and usage counters
    pub async fn analyze(&self, article_content: &str) -> Result<(ArticleAnalysis, UsageReport)> {
        let prompt = render_prompt(self.config.prompt_template.as_deref(), article_content);
        let request = build_request(&self.config.model, &prompt);

        debug!(
            "Requesting analysis from {} using {} ({} prompt chars)",
            self.endpoint,
            self.config.model,
            prompt.chars().count()
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AnalyzeError::from_status(status, error_message(&body)));
        }

        let (analysis, usage) = decode_response(&body)?;
        info!(
            "Article analyzed as {}: {} prompt tokens, {} completion tokens",
            analysis.sentiment, usage.prompt_tokens, usage.completion_tokens
        );

        Ok((analysis, usage))
    }
}

/// Builds an analyzer from `config` and analyzes one article.
///
/// # Errors
///
/// Returns an error if the analyzer cannot be built or the analysis fails,
/// see [`ArticleAnalyzer::new`] and [`ArticleAnalyzer::analyze`].
pub async fn analyze(
    config: AnalyzerConfig,
    article_content: &str,
) -> Result<(ArticleAnalysis, UsageReport)> {
    ArticleAnalyzer::new(config)?.analyze(article_content).await
}

/// Renders the user prompt for an article.
///
/// A `{text}` placeholder in the template is replaced by the article. Templates
/// without it get the article appended after a blank line.
pub fn render_prompt(template: Option<&str>, text: &str) -> String {
    let template = template.unwrap_or(DEFAULT_PROMPT_TEMPLATE);
    if template.contains("{text}") {
        template.replace("{text}", text)
    } else {
        format!("{}\n\n{text}", template.trim_end())
    }
}

fn build_request<'a>(model: &'a str, prompt: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: [
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT,
            },
            ChatMessage {
                role: "user",
                content: prompt,
            },
        ],
        response_format: ResponseFormat {
            kind: "json_schema",
            json_schema: JsonSchemaFormat {
                name: RESPONSE_FORMAT_NAME,
                strict: true,
                schema: &RESPONSE_SCHEMA,
            },
        },
    }
}

fn auth_headers(credentials: &Credentials) -> Result<HeaderMap> {
    let header_value = |env_name: &str, raw: &str| {
        HeaderValue::from_str(raw).map_err(|_| {
            AnalyzeError::Configuration(format!(
                "{env_name} contains characters not allowed in an HTTP header"
            ))
        })
    };

    let mut authorization =
        header_value(API_KEY_ENV_NAME, &format!("Bearer {}", credentials.api_key))?;
    authorization.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, authorization);
    headers.insert(
        HeaderName::from_static(ORGANIZATION_HEADER),
        header_value(ORG_ID_ENV_NAME, &credentials.organization)?,
    );
    headers.insert(
        HeaderName::from_static(PROJECT_HEADER),
        header_value(PROJECT_ID_ENV_NAME, &credentials.project)?,
    );
    Ok(headers)
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_owned())
}

fn decode_response(body: &str) -> Result<(ArticleAnalysis, UsageReport)> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|err| {
        AnalyzeError::SchemaValidation(format!("Malformed response envelope: {err}"))
    })?;

    let message = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| AnalyzeError::SchemaValidation("Response has no choices".to_owned()))?;

    if let Some(refusal) = message.refusal.filter(|refusal| !refusal.is_empty()) {
        return Err(AnalyzeError::SchemaValidation(format!(
            "Model refused to answer: {refusal}"
        )));
    }

    let content = message
        .content
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| AnalyzeError::SchemaValidation("Response message is empty".to_owned()))?;

    let analysis: ArticleAnalysis = serde_json::from_str(&content).map_err(|err| {
        AnalyzeError::SchemaValidation(format!(
            "Content does not match {RESPONSE_FORMAT_NAME}: {err}"
        ))
    })?;

    let usage = response
        .usage
        .map(|usage| UsageReport {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        })
        .ok_or_else(|| AnalyzeError::SchemaValidation("Response has no usage block".to_owned()))?;

    Ok((analysis, usage))
}
