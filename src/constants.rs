pub const API_KEY_ENV_NAME: &str = "OPENAI_API_KEY";
pub const ORG_ID_ENV_NAME: &str = "OPENAI_ORG_ID";
pub const PROJECT_ID_ENV_NAME: &str = "OPENAI_PROJECT_ID";

pub const CONFIG_SECTION: &str = "api";
pub const API_KEY_CONFIG_KEY: &str = "API_KEY";
pub const ORG_ID_CONFIG_KEY: &str = "ORG_KEY";
pub const PROJECT_ID_CONFIG_KEY: &str = "PROJECT_KEY";

pub const DEFAULT_CONFIG_PATH: &str = "config.ini";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini-2024-07-18";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";

/// Name of the declared structured output format.
pub const RESPONSE_FORMAT_NAME: &str = "ArticleAnalysis";

pub(crate) const SYSTEM_PROMPT: &str = "AI assistant. Use the ArticleAnalysis schema for response.";

pub(crate) const DEFAULT_PROMPT_TEMPLATE: &str = r#"Hãy tóm tắt bài báo sau đây và đánh giá nội dung theo 3 mức độ: 'positive', 'negative', hoặc 'neutral'. Trả về kết quả dưới dạng JSON với cấu trúc sau:

{
  "summary": "",
  "sentiment": "positive | negative | neutral"
}

Lưu ý:
- 'summary' chỉ nên dài khoảng 200 từ, tóm gọn ý chính của bài báo.
- 'sentiment' phải là một trong ba giá trị: 'positive', 'negative', hoặc 'neutral'.

Dưới đây là nội dung bài báo:

{text}"#;

/// Article analyzed when no input file is given.
pub const SAMPLE_ARTICLE: &str = include_str!("sample_article.html");
