//! Provider integration tests
//!
//! Each test points one vendor at a wiremock server and checks both the
//! outbound request and the fragments produced from the vendor's response.

use pretty_assertions::assert_eq;

use codestream::providers::CODE_INSTRUCTION;
use codestream::{ChatCompletionRequest, CodegenError, Message};

use crate::common::{collect, config, constants, registry_for};
use crate::mocks::MockVendor;

/// OpenAI-compatible vendors with their credential and base URL variables
const OPENAI_COMPATIBLE: &[(&str, &str, &str)] = &[
    ("openai", "OPENAI_API_KEY", "OPENAI_BASE_URL"),
    ("groq", "GROQ_API_KEY", "GROQ_BASE_URL"),
    ("mistral", "MISTRAL_API_KEY", "MISTRAL_BASE_URL"),
    ("together", "TOGETHER_API_KEY", "TOGETHER_BASE_URL"),
    ("openrouter", "OPEN_ROUTER_API_KEY", "OPEN_ROUTER_BASE_URL"),
    ("fireworks", "FIREWORKS_API_KEY", "FIREWORKS_BASE_URL"),
    ("glhf", "GLHF_API_KEY", "GLHF_BASE_URL"),
    ("sambanova", "SAMBANOVA_API_KEY", "SAMBANOVA_BASE_URL"),
    ("upstage", "UPSTAGE_API_KEY", "UPSTAGE_BASE_URL"),
    ("edenai", "EDENAI_API_KEY", "EDENAI_BASE_URL"),
    ("deepseek", "DEEPSEEK_API_KEY", "DEEPSEEK_BASE_URL"),
    ("hyperbolic", "HYPERBOLIC_API_KEY", "HYPERBOLIC_BASE_URL"),
];

fn request(model: &str) -> ChatCompletionRequest {
    ChatCompletionRequest::new(model, vec![Message::user("a counter component")])
}

#[tokio::test]
async fn test_every_openai_compatible_vendor_reconstructs_output() {
    let deltas = ["function Counter() {", "\\n  return <div/>;", "\n}"];
    let expected = "function Counter() {\n  return <div/>;\n}";

    for (vendor, credential, base_url_var) in OPENAI_COMPATIBLE {
        let mock = MockVendor::start().await;
        mock.mock_chat_stream(&deltas).await;

        let registry = registry_for(credential, base_url_var, &mock.uri());
        let resolved = registry
            .resolve(&format!("{}/some-model", vendor))
            .unwrap_or_else(|e| panic!("{}: {}", vendor, e));
        let stream = resolved
            .provider
            .submit(&request(&format!("{}/some-model", vendor)))
            .await
            .unwrap_or_else(|e| panic!("{}: {}", vendor, e));

        let (fragments, error) = collect(stream).await;
        assert!(error.is_none(), "{}: unexpected error {:?}", vendor, error);
        assert_eq!(fragments.concat(), expected, "vendor {}", vendor);
    }
}

#[tokio::test]
async fn test_request_body_carries_instruction_and_mapped_model() {
    let mock = MockVendor::start().await;
    mock.mock_chat_stream(&["ok"]).await;

    let registry = registry_for("GROQ_API_KEY", "GROQ_BASE_URL", &mock.uri());
    let resolved = registry.resolve("groq/llama2-70b").unwrap();
    let (fragments, _) = collect(
        resolved
            .provider
            .submit(&request("groq/llama2-70b"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(fragments, vec!["ok"]);

    let bodies = mock.received_bodies().await;
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(body["model"], "llama2-70b-4096");
    assert_eq!(body["stream"], true);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], CODE_INSTRUCTION);
    assert!(body["messages"][1]["content"]
        .as_str()
        .unwrap()
        .starts_with("a counter component\n"));

    assert_eq!(
        mock.first_request_header("authorization").await.as_deref(),
        Some(format!("Bearer {}", constants::TEST_API_KEY).as_str())
    );
}

#[tokio::test]
async fn test_glhf_model_gets_hf_prefix() {
    let mock = MockVendor::start().await;
    mock.mock_chat_stream(&["x"]).await;

    let registry = registry_for("GLHF_API_KEY", "GLHF_BASE_URL", &mock.uri());
    let resolved = registry.resolve("glhf/org/custom-model").unwrap();
    collect(resolved.provider.submit(&request("glhf/org/custom-model")).await.unwrap()).await;

    assert_eq!(mock.received_bodies().await[0]["model"], "hf:org/custom-model");
}

#[tokio::test]
async fn test_openrouter_sends_attribution_headers() {
    let mock = MockVendor::start().await;
    mock.mock_chat_stream(&["x"]).await;

    let uri = mock.uri();
    let config = config(&[
        ("OPEN_ROUTER_API_KEY", constants::TEST_API_KEY),
        ("OPEN_ROUTER_BASE_URL", uri.as_str()),
        ("NEXT_PUBLIC_SITE_URL", "https://builder.example"),
        ("NEXT_PUBLIC_APP_NAME", "Builder"),
    ]);
    let registry = codestream::ProviderRegistry::with_client(config, reqwest::Client::new());
    let resolved = registry.resolve("openrouter/gpt-4").unwrap();
    collect(resolved.provider.submit(&request("openrouter/gpt-4")).await.unwrap()).await;

    assert_eq!(
        mock.first_request_header("http-referer").await.as_deref(),
        Some("https://builder.example")
    );
    assert_eq!(mock.first_request_header("x-title").await.as_deref(), Some("Builder"));
    assert_eq!(mock.received_bodies().await[0]["model"], "openai/gpt-4");
}

#[tokio::test]
async fn test_non_streaming_request_yields_one_fragment() {
    let mock = MockVendor::start().await;
    mock.mock_chat_completion("function f(){}").await;

    let registry = registry_for("OPENAI_API_KEY", "OPENAI_BASE_URL", &mock.uri());
    let resolved = registry.resolve("openai/gpt-4").unwrap();
    let stream = resolved
        .provider
        .submit(&request("openai/gpt-4").with_stream(false))
        .await
        .unwrap();

    let (fragments, error) = collect(stream).await;
    assert_eq!(fragments, vec!["function f(){}"]);
    assert!(error.is_none());
    assert_eq!(mock.received_bodies().await[0]["stream"], false);
}

#[tokio::test]
async fn test_ai21_is_one_shot() {
    let mock = MockVendor::start().await;
    mock.mock_ai21_complete("j2-ultra", "function f(){}").await;

    let registry = registry_for("AI21_API_KEY", "AI21_BASE_URL", &mock.uri());
    let resolved = registry.resolve("ai21/j2-ultra").unwrap();
    let (fragments, error) = collect(resolved.provider.submit(&request("ai21/j2-ultra")).await.unwrap()).await;

    assert_eq!(fragments, vec!["function f(){}"]);
    assert!(error.is_none());

    let body = &mock.received_bodies().await[0];
    let prompt = body["prompt"].as_str().unwrap();
    assert!(prompt.starts_with("system: "));
    assert!(prompt.ends_with("\nuser: a counter component"));
    assert_eq!(body["topP"], 1.0);
}

#[tokio::test]
async fn test_cohere_stream_skips_event_lines() {
    let mock = MockVendor::start().await;
    mock.mock_cohere_stream(&["def f():", "\\n    pass"]).await;

    let registry = registry_for("COHERE_API_KEY", "COHERE_BASE_URL", &mock.uri());
    let resolved = registry.resolve("cohere/command-r").unwrap();
    let (fragments, error) = collect(resolved.provider.submit(&request("cohere/command-r")).await.unwrap()).await;

    assert!(error.is_none());
    assert_eq!(fragments, vec!["def f():", "\n    pass"]);
}

#[tokio::test]
async fn test_gemini_stream() {
    let mock = MockVendor::start().await;
    mock.mock_gemini_stream("gemini-1.5-pro", &["<main>", "</main>"]).await;

    let registry = registry_for(
        "GOOGLE_GENERATIVE_AI_API_KEY",
        "GOOGLE_GENERATIVE_AI_BASE_URL",
        &mock.uri(),
    );
    let resolved = registry.resolve("gemini/gemini-pro").unwrap();
    assert_eq!(resolved.model, "gemini-1.5-pro");

    let (fragments, error) = collect(resolved.provider.submit(&request("gemini/gemini-pro")).await.unwrap()).await;
    assert!(error.is_none());
    assert_eq!(fragments, vec!["<main>", "</main>"]);

    let body = &mock.received_bodies().await[0];
    assert_eq!(body["contents"][0]["role"], "user");
    assert_eq!(body["systemInstruction"]["parts"][0]["text"], CODE_INSTRUCTION);
}

#[tokio::test]
async fn test_vendor_error_status_is_reported_verbatim() {
    let mock = MockVendor::start().await;
    mock.mock_error(
        "/chat/completions",
        401,
        r#"{"error":{"message":"Invalid API key provided"}}"#,
    )
    .await;

    let registry = registry_for("MISTRAL_API_KEY", "MISTRAL_BASE_URL", &mock.uri());
    let resolved = registry.resolve("mistral/mistral-small").unwrap();
    let err = match resolved.provider.submit(&request("mistral/mistral-small")).await {
        Err(e) => e,
        Ok(_) => panic!("expected a vendor error"),
    };

    match err {
        CodegenError::VendorApi { vendor, status, message } => {
            assert_eq!(vendor, "mistral");
            assert_eq!(status, 401);
            assert_eq!(message, r#"{"error":{"message":"Invalid API key provided"}}"#);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_vendor_error_with_empty_body_uses_status_reason() {
    let mock = MockVendor::start().await;
    mock.mock_error("/chat/completions", 503, "").await;

    let registry = registry_for("OPENAI_API_KEY", "OPENAI_BASE_URL", &mock.uri());
    let resolved = registry.resolve("openai/gpt-4").unwrap();
    match resolved.provider.submit(&request("openai/gpt-4")).await {
        Err(CodegenError::VendorApi { status, message, .. }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "Service Unavailable");
        }
        Err(e) => panic!("unexpected error: {:?}", e),
        Ok(_) => panic!("expected a vendor error"),
    }
}

#[tokio::test]
async fn test_unreachable_vendor_is_transport_error() {
    // Nothing listens on port 1
    let unreachable = "http://127.0.0.1:1";
    let cases = [
        ("openai/gpt-4", "OPENAI_API_KEY", "OPENAI_BASE_URL"),
        ("ai21/j2-ultra", "AI21_API_KEY", "AI21_BASE_URL"),
        ("cohere/command-r", "COHERE_API_KEY", "COHERE_BASE_URL"),
        (
            "gemini/gemini-pro",
            "GOOGLE_GENERATIVE_AI_API_KEY",
            "GOOGLE_GENERATIVE_AI_BASE_URL",
        ),
    ];

    for (model, credential, base_url_var) in cases {
        let registry = registry_for(credential, base_url_var, unreachable);
        let resolved = registry.resolve(model).unwrap();
        match resolved.provider.submit(&request(model)).await {
            Err(e) => {
                assert!(matches!(e, CodegenError::Transport(_)), "{}: {:?}", model, e);
                assert_eq!(e.code(), "transport_error");
            }
            Ok(_) => panic!("{}: expected a transport error", model),
        }
    }
}

#[tokio::test]
async fn test_in_stream_error_terminates_after_content() {
    let mock = MockVendor::start().await;
    let mut body = crate::mocks::openai_sse(&["partial"]);
    body = body.replace(
        "data: [DONE]\n\n",
        "data: {\"error\":{\"message\":\"overloaded\"}}\n\n",
    );
    mock.mock_sse("/chat/completions", body).await;

    let registry = registry_for("DEEPSEEK_API_KEY", "DEEPSEEK_BASE_URL", &mock.uri());
    let resolved = registry.resolve("deepseek/deepseek-coder-33b").unwrap();
    let (fragments, error) = collect(
        resolved
            .provider
            .submit(&request("deepseek/deepseek-coder-33b"))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(fragments, vec!["partial"]);
    match error {
        Some(CodegenError::Stream(message)) => assert_eq!(message, "overloaded"),
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_plain_text_body_is_passed_through() {
    let mock = MockVendor::start().await;
    mock.mock_sse(
        "/chat/completions",
        "const a = 1;\nconst b = 2;\n".to_string(),
    )
    .await;

    let registry = registry_for("SAMBANOVA_API_KEY", "SAMBANOVA_BASE_URL", &mock.uri());
    let resolved = registry.resolve("sambanova/Meta-Llama-3.1-8B").unwrap();
    let (fragments, error) = collect(
        resolved
            .provider
            .submit(&request("sambanova/Meta-Llama-3.1-8B"))
            .await
            .unwrap(),
    )
    .await;

    assert!(error.is_none());
    assert_eq!(fragments.concat(), "const a = 1;\nconst b = 2;\n");
}
