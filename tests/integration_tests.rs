mod common;

use agentmedia::{
  ClientConfig, CompletionRequest, Error, ErrorKind, OpenRouterClient,
  PricingTable, TokenRate
};
use common::{completion_body, StubServer, TEST_KEY};
use tokio_test::{assert_err, assert_ok};

const MODEL: &str = "anthropic/claude-3.5-sonnet";

fn request(user_message: &str) -> CompletionRequest
{   CompletionRequest
    {   model: MODEL.to_string()
      , system_prompt: "Tu es un assistant.".to_string()
      , user_message: user_message.to_string()
      , temperature: 0.7
      , max_tokens: 400
    }
}

#[test]
fn test_client_requires_api_key()
{   let err = OpenRouterClient::new(ClientConfig::new("")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn test_envelope_reports_usage_and_cost()
{   common::init_logging();
    let stub = StubServer::completion("Bonjour!", 1200, 300).await;
    let client = stub.client();

    let completion = assert_ok!(
      client.complete("Test", &request("Salut")).await
    );

    assert_eq!(completion.content, "Bonjour!");
    assert_eq!(completion.model, MODEL);
    assert_eq!(completion.prompt_tokens, 1200);
    assert_eq!(completion.completion_tokens, 300);
    assert_eq!(
      completion.total_tokens
    , completion.prompt_tokens + completion.completion_tokens
    );
    // 1200 * $3/M + 300 * $15/M
    assert!((completion.estimated_cost_usd - 0.0081).abs() < 1e-12);
    assert_eq!(
      completion.estimated_cost_usd
    , PricingTable::default().estimate(MODEL, 1200, 300)
    );
    assert_eq!(stub.hits(), 1);
}

#[tokio::test]
async fn test_request_wire_format()
{   let stub = StubServer::completion("ok", 1, 1).await;
    let client = stub.client();

    assert_ok!(client.complete("Test", &request("Quel temps fait-il?")).await);

    let captured = &stub.requests()[0];
    assert_eq!(
      captured.request_line()
    , "POST /api/v1/chat/completions HTTP/1.1"
    );
    assert_eq!(
      captured.header("authorization")
    , Some(format!("Bearer {}", TEST_KEY))
    );
    assert_eq!(
      captured.header("http-referer").as_deref()
    , Some("https://app.example.test")
    );
    assert_eq!(captured.header("x-title").as_deref(), Some("AstroMedia"));
    assert_eq!(
      captured.header("content-type").as_deref()
    , Some("application/json")
    );

    let body = captured.json();
    assert_eq!(body["model"], MODEL);
    assert_eq!(body["max_tokens"], 400);
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[0]["content"], "Tu es un assistant.");
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[1]["content"], "Quel temps fait-il?");
}

#[tokio::test]
async fn test_non_success_status_is_transport_error_without_retry()
{   for status in [429u16, 500, 503]
    {   let stub = StubServer::start(
          status,
          r#"{"error": {"message": "upstream unavailable"}}"#.to_string()
        ).await;
        let client = stub.client();

        let err = assert_err!(client.complete("Test", &request("x")).await);

        assert!(err.is_transport());
        match err
        {   Error::ApiError { status: got, body } => {
              assert_eq!(got, status);
              assert!(body.contains("upstream unavailable"));
            }
          , other => panic!("unexpected error: {:?}", other)
        }
        assert_eq!(stub.hits(), 1);
    }
}

#[tokio::test]
async fn test_missing_usage_counts_as_zero()
{   let stub = StubServer::start(
      200,
      r#"{"choices": [{"message": {"content": "hi"}}]}"#.to_string()
    ).await;

    let completion = assert_ok!(
      stub.client().complete("Test", &request("x")).await
    );
    assert_eq!(completion.total_tokens, 0);
    assert_eq!(completion.estimated_cost_usd, 0.0);
}

#[tokio::test]
async fn test_total_tokens_derived_when_omitted()
{   let stub = StubServer::start(
      200,
      r#"{"choices": [{"message": {"content": "hi"}}],
          "usage": {"prompt_tokens": 10, "completion_tokens": 5}}"#
        .to_string()
    ).await;

    let completion = assert_ok!(
      stub.client().complete("Test", &request("x")).await
    );
    assert_eq!(completion.total_tokens, 15);
}

#[tokio::test]
async fn test_undecodable_envelope_is_call_error()
{   let stub = StubServer::start(200, "<html>oops</html>".to_string()).await;

    let err = assert_err!(stub.client().complete("Test", &request("x")).await);
    assert!(matches!(err, Error::ParseError(_)));
    assert_eq!(err.kind(), ErrorKind::Call);
}

#[tokio::test]
async fn test_empty_choices_is_call_error()
{   let stub = StubServer::start(200, r#"{"choices": []}"#.to_string()).await;

    let err = assert_err!(stub.client().complete("Test", &request("x")).await);
    assert_eq!(err, Error::NoChoicesInResponse);
}

#[tokio::test]
async fn test_connection_refused_is_transport_error()
{   let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = OpenRouterClient::new(
      ClientConfig::new(TEST_KEY)
        .with_api_base(format!("http://{}/api/v1", addr))
    ).unwrap();

    let err = assert_err!(client.complete("Test", &request("x")).await);
    assert!(matches!(err, Error::HttpError(_)));
}

#[tokio::test]
async fn test_slow_upstream_times_out()
{   let stub = StubServer::hanging().await;
    let client = OpenRouterClient::new(
      stub.config().with_timeout_secs(1)
    ).unwrap();

    let err = assert_err!(client.complete("Test", &request("x")).await);
    assert_eq!(err, Error::Timeout);
    assert_eq!(stub.hits(), 1);
}

#[tokio::test]
async fn test_invalid_request_never_reaches_network()
{   let stub = StubServer::completion("unused", 1, 1).await;
    let mut bad = request("x");
    bad.temperature = 3.0;

    let err = assert_err!(stub.client().complete("Test", &bad).await);
    assert!(matches!(err, Error::InvalidRequest(_)));
    assert_eq!(stub.hits(), 0);
}

#[tokio::test]
async fn test_custom_pricing_is_applied()
{   let stub = StubServer::completion("ok", 1_000_000, 1_000_000).await;
    let client = stub.client().with_pricing(
      PricingTable::flat(TokenRate::new(1.0, 2.0))
    );

    let completion = assert_ok!(client.complete("Test", &request("x")).await);
    assert!((completion.estimated_cost_usd - 3.0).abs() < 1e-12);
}

#[tokio::test]
async fn test_concurrent_requests_do_not_interfere()
{   let mut handles = Vec::new();
    let mut stubs = Vec::new();

    for i in 0..8u64
    {   let stub = StubServer::completion(
          &format!("réponse {}", i),
          100 * (i + 1),
          10 * (i + 1)
        ).await;
        let client = stub.client();
        stubs.push(stub);

        handles.push(tokio::spawn(async move {
          client.complete("Test", &request(&format!("question {}", i))).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate()
    {   let i = i as u64;
        let completion = assert_ok!(handle.await.unwrap());
        assert_eq!(completion.content, format!("réponse {}", i));
        assert_eq!(completion.prompt_tokens, 100 * (i + 1));
        assert_eq!(completion.completion_tokens, 10 * (i + 1));
        assert_eq!(completion.total_tokens, 110 * (i + 1));
    }

    for (i, stub) in stubs.iter().enumerate()
    {   assert_eq!(stub.hits(), 1);
        let body = stub.requests()[0].json();
        assert_eq!(body["messages"][1]["content"], format!("question {}", i));
    }
}

#[test]
fn test_completion_body_helper_is_decodable()
{   let body: serde_json::Value
      = serde_json::from_str(&completion_body("x", 2, 3)).unwrap();
    assert_eq!(body["usage"]["total_tokens"], 5);
}
