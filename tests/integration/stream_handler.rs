//! StreamHandler over real HTTP responses

use pretty_assertions::assert_eq;

use codestream::{CodegenError, StreamHandler};

use crate::mocks::{openai_sse, MockVendor};

#[tokio::test]
async fn test_handle_response_delivers_fragments_then_end() {
    let mock = MockVendor::start().await;
    mock.mock_get_stream("/api/generate", &openai_sse(&["a", "\\nb"])).await;

    let response = reqwest::get(format!("{}/api/generate", mock.uri())).await.unwrap();

    let mut received = Vec::new();
    let mut ended = 0;
    StreamHandler::new(|c: &str| received.push(c.to_string()), || ended += 1)
        .handle_response(response)
        .await
        .unwrap();

    assert_eq!(received, vec!["a", "\nb"]);
    assert_eq!(ended, 1);
}

#[tokio::test]
async fn test_handle_response_plain_text_with_fences() {
    let mock = MockVendor::start().await;
    mock.mock_get_stream("/api/generate", "```html\n<p>hi</p>\n```").await;

    let response = reqwest::get(format!("{}/api/generate", mock.uri())).await.unwrap();

    let mut code = String::new();
    let mut ended = false;
    StreamHandler::new(|c: &str| code.push_str(c), || ended = true)
        .with_fence_stripping()
        .handle_response(response)
        .await
        .unwrap();

    assert_eq!(code, "<p>hi</p>");
    assert!(ended);
}

#[tokio::test]
async fn test_handle_response_error_status() {
    let mock = MockVendor::start().await;
    mock.mock_error("/api/generate", 500, "upstream exploded").await;

    let response = reqwest::get(format!("{}/api/generate", mock.uri())).await.unwrap();

    let mut ended = false;
    let result = StreamHandler::new(|_: &str| panic!("no content expected"), || ended = true)
        .handle_response(response)
        .await;

    match result {
        Err(CodegenError::VendorApi { status, message, .. }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(!ended);
}

#[tokio::test]
async fn test_handle_response_error_status_without_body() {
    let mock = MockVendor::start().await;
    mock.mock_error("/api/generate", 429, "").await;

    let response = reqwest::get(format!("{}/api/generate", mock.uri())).await.unwrap();

    let result = StreamHandler::new(|_: &str| panic!("no content expected"), || {})
        .handle_response(response)
        .await;

    match result {
        Err(CodegenError::VendorApi { status, message, .. }) => {
            assert_eq!(status, 429);
            assert_eq!(message, "Too Many Requests");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}
