use llamood::{AnalyzerConfig, ArticleAnalyzer, Credentials};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub(crate) const ARTICLE: &str =
    "<p>Quốc hội thông qua kế hoạch đầu tư công cho các dự án giao thông trọng điểm.</p>";

#[macro_export]
macro_rules! assert_sentiments {
    (
        $(
            $test_name:ident : content => $content:expr, sentiment => $sentiment:expr
        ),+ $(,)?
    ) => {
        $(
            #[tokio::test]
            async fn $test_name() {
                let server = $crate::analyze_extras::stub_completion(
                    $crate::analyze_extras::completion($content, 10, 5),
                )
                .await;
                let (analysis, _) = $crate::analyze_extras::analyzer(&server)
                    .analyze($crate::analyze_extras::ARTICLE)
                    .await
                    .expect("Expected successful analysis.");

                assert_that(&analysis.sentiment).is_equal_to($sentiment);
            }
        )+
    }
}

pub(crate) fn credentials() -> Credentials {
    Credentials::new("sk-test", "org-test", "proj-test")
}

pub(crate) fn analyzer(server: &MockServer) -> ArticleAnalyzer {
    let config = AnalyzerConfig::new(credentials()).with_base_url(&server.uri());
    ArticleAnalyzer::new(config).expect("Expected valid analyzer configuration.")
}

/// Chat completion envelope carrying `content` as the assistant message.
pub(crate) fn completion(content: &str, prompt_tokens: u64, completion_tokens: u64) -> Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1_719_475_200,
        "model": "gpt-4o-mini-2024-07-18",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": content,
                "refusal": null
            },
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": prompt_tokens,
            "completion_tokens": completion_tokens,
            "total_tokens": prompt_tokens + completion_tokens
        }
    })
}

pub(crate) fn api_error(message: &str, error_type: &str) -> Value {
    json!({
        "error": {
            "message": message,
            "type": error_type,
            "param": null,
            "code": null
        }
    })
}

pub(crate) async fn stub_completion(body: Value) -> MockServer {
    stub_status(200, body).await
}

pub(crate) async fn stub_status(status: u16, body: Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;
    server
}
