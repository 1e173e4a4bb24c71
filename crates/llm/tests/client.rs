//! Retry, fallback, and caching behaviour of `LlmClient` against a scripted
//! transport. Time is paused, so back-off sleeps complete instantly while
//! `tokio::time::Instant` still observes them.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use llm::{
    Backend, Gemini, HttpReply, HttpRequest, HttpTransport, LlmClient, OpenRouter, TransportError,
};
use pipeline::{CompletionProvider, ProviderError, ResponseCache};
use tokio::time::Instant;

#[derive(Default)]
struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<HttpReply, TransportError>>>,
    calls: Mutex<Vec<(Instant, HttpRequest)>>,
}

impl ScriptedTransport {
    fn new(replies: Vec<Result<HttpReply, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::default(),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn urls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, r)| r.url.clone())
            .collect()
    }

    fn gaps(&self) -> Vec<Duration> {
        let calls = self.calls.lock().unwrap();
        calls.windows(2).map(|w| w[1].0 - w[0].0).collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn post_json(&self, request: &HttpRequest) -> Result<HttpReply, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now(), request.clone()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError("script exhausted".into())))
    }
}

fn reply(status: u16, body: &str) -> Result<HttpReply, TransportError> {
    Ok(HttpReply {
        status,
        retry_after: None,
        body: body.to_owned(),
    })
}

fn chat_ok(content: &str) -> Result<HttpReply, TransportError> {
    reply(
        200,
        &format!(r#"{{"choices":[{{"message":{{"content":"{content}"}}}}]}}"#),
    )
}

fn gemini_ok(text: &str) -> Result<HttpReply, TransportError> {
    reply(
        200,
        &format!(r#"{{"candidates":[{{"content":{{"parts":[{{"text":"{text}"}}]}}}}]}}"#),
    )
}

fn openrouter_client(transport: Arc<ScriptedTransport>) -> LlmClient {
    let backend = OpenRouter::new(
        "sk-or-v1-0123456789abcdef0123",
        "openai/gpt-4o-mini",
        "https://example.test",
    )
    .unwrap();
    LlmClient::new(
        Backend::OpenRouter(backend),
        transport,
        Arc::new(ResponseCache::new()),
    )
}

fn gemini_client(transport: Arc<ScriptedTransport>) -> LlmClient {
    let backend = Gemini::new("AIza-test", "gemini-2.5-flash").unwrap();
    LlmClient::new(Backend::Gemini(backend), transport, Arc::new(ResponseCache::new()))
}

#[tokio::test(start_paused = true)]
async fn success_is_cached_for_identical_calls() {
    let transport = ScriptedTransport::new(vec![chat_ok("Apple")]);
    let client = openrouter_client(transport.clone());

    assert_eq!(client.complete("iPhone news", "Brand?").await.unwrap(), "Apple");
    assert_eq!(client.complete("iPhone news", "Brand?").await.unwrap(), "Apple");
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn different_prompt_is_a_cache_miss() {
    let transport = ScriptedTransport::new(vec![chat_ok("Apple"), chat_ok("Phones")]);
    let client = openrouter_client(transport.clone());

    client.complete("iPhone news", "Brand?").await.unwrap();
    assert_eq!(
        client.complete("iPhone news", "Category?").await.unwrap(),
        "Phones"
    );
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn unauthorized_fails_immediately() {
    let transport = ScriptedTransport::new(vec![reply(401, "invalid key"), chat_ok("never")]);
    let client = openrouter_client(transport.clone());

    let err = client.complete("text", "prompt").await.unwrap_err();
    assert!(matches!(err, ProviderError::Auth { status: 401, .. }));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_honours_retry_after() {
    let transport = ScriptedTransport::new(vec![
        Ok(HttpReply {
            status: 429,
            retry_after: Some("5".into()),
            body: "slow down".into(),
        }),
        chat_ok("ok"),
    ]);
    let client = openrouter_client(transport.clone());

    let started = Instant::now();
    assert_eq!(client.complete("text", "prompt").await.unwrap(), "ok");
    assert!(started.elapsed() >= Duration::from_secs(5));
    assert!(transport.gaps()[0] >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn server_delay_only_stretches_rate_limit_waits() {
    let transport = ScriptedTransport::new(vec![
        Ok(HttpReply {
            status: 503,
            retry_after: Some("30".into()),
            body: "unavailable".into(),
        }),
        chat_ok("ok"),
    ]);
    let client = openrouter_client(transport.clone());

    assert_eq!(client.complete("text", "prompt").await.unwrap(), "ok");
    let gap = transport.gaps()[0];
    assert!(gap >= Duration::from_secs(2), "{gap:?}");
    assert!(gap < Duration::from_secs(30), "{gap:?}");
}

#[tokio::test(start_paused = true)]
async fn rate_limit_gives_up_after_ceiling() {
    let transport = ScriptedTransport::new((0..4).map(|_| reply(429, "")).collect());
    let client = openrouter_client(transport.clone());

    let err = client.complete("text", "prompt").await.unwrap_err();
    assert_eq!(err, ProviderError::RateLimitExceeded { attempts: 3 });
    assert_eq!(transport.call_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn server_errors_back_off_then_succeed() {
    let transport = ScriptedTransport::new(vec![
        reply(500, "boom"),
        reply(502, "bad gateway"),
        reply(503, "unavailable"),
        chat_ok("recovered"),
    ]);
    let client = openrouter_client(transport.clone());

    assert_eq!(
        client.complete("text", "prompt").await.unwrap(),
        "recovered"
    );
    let gaps = transport.gaps();
    assert_eq!(gaps.len(), 3);
    assert!(gaps[0] >= Duration::from_secs(2));
    assert!(gaps[0] < gaps[1] && gaps[1] < gaps[2]);
}

#[tokio::test(start_paused = true)]
async fn persistent_server_error_surfaces_last_status() {
    let transport = ScriptedTransport::new((0..4).map(|_| reply(503, "down")).collect());
    let client = openrouter_client(transport.clone());

    let err = client.complete("text", "prompt").await.unwrap_err();
    assert!(matches!(err, ProviderError::Server { status: 503, .. }));
}

#[tokio::test(start_paused = true)]
async fn other_client_errors_are_not_retried() {
    let transport = ScriptedTransport::new(vec![reply(400, "bad request"), chat_ok("never")]);
    let client = openrouter_client(transport.clone());

    let err = client.complete("text", "prompt").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "OpenRouter API error: 400 - bad request"
    );
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn network_failures_are_retried() {
    let transport = ScriptedTransport::new(vec![
        Err(TransportError("connection reset".into())),
        chat_ok("fine"),
    ]);
    let client = openrouter_client(transport.clone());

    assert_eq!(client.complete("text", "prompt").await.unwrap(), "fine");
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn failures_are_not_cached() {
    let transport = ScriptedTransport::new(vec![reply(403, "nope"), chat_ok("later")]);
    let client = openrouter_client(transport.clone());

    assert!(client.complete("text", "prompt").await.is_err());
    assert_eq!(client.complete("text", "prompt").await.unwrap(), "later");
}

#[tokio::test(start_paused = true)]
async fn malformed_envelope_becomes_empty_text() {
    let transport = ScriptedTransport::new(vec![reply(200, r#"{"id":"x"}"#)]);
    let client = openrouter_client(transport.clone());

    assert_eq!(client.complete("text", "prompt").await.unwrap(), "");
}

#[tokio::test(start_paused = true)]
async fn gemini_falls_back_to_v1beta() {
    let transport = ScriptedTransport::new(vec![reply(404, "model not found"), gemini_ok("Nike")]);
    let client = gemini_client(transport.clone());

    assert_eq!(client.complete("Sneaker news", "Brand?").await.unwrap(), "Nike");
    let urls = transport.urls();
    assert!(urls[0].contains("/v1/models/gemini-2.5-flash"));
    assert!(urls[1].contains("/v1beta/models/gemini-2.5-flash"));
}

#[tokio::test(start_paused = true)]
async fn gemini_rate_limit_uses_retry_info() {
    let quota = r#"{"error":{"code":429,"details":[
        {"@type":"type.googleapis.com/google.rpc.RetryInfo","retryDelay":"7s"}]}}"#;
    let transport = ScriptedTransport::new(vec![reply(429, quota), gemini_ok("ok")]);
    let client = gemini_client(transport.clone());

    assert_eq!(client.complete("text", "prompt").await.unwrap(), "ok");
    assert!(transport.gaps()[0] >= Duration::from_secs(7));
}

#[tokio::test(start_paused = true)]
async fn providers_do_not_share_cache_entries() {
    let cache = Arc::new(ResponseCache::new());
    let or_transport = ScriptedTransport::new(vec![chat_ok("from openrouter")]);
    let gm_transport = ScriptedTransport::new(vec![gemini_ok("from gemini")]);
    let openrouter = LlmClient::new(
        Backend::OpenRouter(OpenRouter::new("sk-or-v1-key", "m", "r").unwrap()),
        or_transport,
        cache.clone(),
    );
    let gemini = LlmClient::new(
        Backend::Gemini(Gemini::new("AIza", "gemini-2.5-flash").unwrap()),
        gm_transport,
        cache.clone(),
    );

    assert_eq!(openrouter.complete("t", "p").await.unwrap(), "from openrouter");
    assert_eq!(gemini.complete("t", "p").await.unwrap(), "from gemini");
    assert_eq!(cache.len(), 2);
}
