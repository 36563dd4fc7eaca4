use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use ddg_task::engine::Engine;
use ddg_task::engine::runner::TaskRunner;
use ddg_task::error::TaskError;
use ddg_task::operators::OperatorRegistry;
use ddg_task::provider::duckduckgo::{ChatError, DuckDuckGoChat, ProviderConfig};
use ddg_task::provider::{ChatProvider, ChatRequest};
use ddg_task::task::TaskInput;

// Points at a port nothing listens on; these tests must fail before any request.
fn offline_provider() -> DuckDuckGoChat {
    DuckDuckGoChat::new(ProviderConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        ..ProviderConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn unknown_model_override_fails_before_request() {
    let provider = offline_provider();
    let request = ChatRequest {
        model: Some("gpt-9".to_string()),
        ..ChatRequest::new("hello")
    };

    let err = provider.chat(&request).await.unwrap_err();
    assert_eq!(err.to_string(), "unknown chat model: gpt-9");
    assert_eq!(provider.estimated_tokens().await, 0);
}

#[tokio::test]
async fn unknown_model_surfaces_as_provider_error() {
    let runner = TaskRunner::new(OperatorRegistry::new(Arc::new(offline_provider())));

    let err = runner
        .run(TaskInput::from(json!({
            "operator": "ddg.chat",
            "kwargs": {"keywords": "hi", "model": "gpt-9"}
        })))
        .await
        .unwrap_err();

    assert!(matches!(err, TaskError::Provider(_)));
    assert_eq!(err.to_string(), "unknown chat model: gpt-9");
}

#[tokio::test]
async fn unreachable_service_is_provider_error() {
    let provider = offline_provider();

    let err = provider.chat(&ChatRequest::new("hello")).await;
    assert!(err.is_err());
    assert_eq!(provider.estimated_tokens().await, 0);
}

/// A request as seen by the fake chat service.
#[derive(Debug, Clone)]
struct Recorded {
    path: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// A canned HTTP response.
struct Reply {
    status: u16,
    headers: Vec<(&'static str, &'static str)>,
    body: &'static str,
}

impl Reply {
    fn ok(body: &'static str) -> Self {
        Self {
            status: 200,
            headers: vec![],
            body,
        }
    }

    fn with_vqd(mut self, vqd: &'static str) -> Self {
        self.headers.push(("x-vqd-4", vqd));
        self
    }
}

async fn read_request(stream: &mut TcpStream) -> Recorded {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed mid-request");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let path = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap()
        .to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    let len: usize = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .map(|(_, v)| v.parse().unwrap())
        .unwrap_or(0);

    while buf.len() < header_end + len {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed mid-body");
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8(buf[header_end..header_end + len].to_vec()).unwrap();

    Recorded {
        path,
        headers,
        body,
    }
}

/// Serve `replies` in order, one connection each, recording every request.
async fn fake_service(replies: Vec<Reply>) -> (String, Arc<Mutex<Vec<Recorded>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&recorded);

    tokio::spawn(async move {
        for reply in replies {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            log.lock().unwrap().push(request);

            let mut response = format!(
                "HTTP/1.1 {} X\r\ncontent-length: {}\r\nconnection: close\r\n",
                reply.status,
                reply.body.len()
            );
            for (name, value) in &reply.headers {
                response.push_str(&format!("{name}: {value}\r\n"));
            }
            response.push_str("\r\n");
            response.push_str(reply.body);
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        }
    });

    (format!("http://{addr}"), recorded)
}

fn provider_at(base_url: String) -> DuckDuckGoChat {
    DuckDuckGoChat::new(ProviderConfig {
        base_url,
        ..ProviderConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn conversation_carries_token_and_history() {
    let (url, recorded) = fake_service(vec![
        Reply::ok("").with_vqd("tok1"),
        Reply::ok("data: {\"message\":\"Hel\"}\n\ndata: {\"message\":\"lo\"}\n\ndata: [DONE]\n")
            .with_vqd("tok2"),
        Reply::ok("data: {\"message\":\"again\"}\n\ndata: [DONE]\n"),
    ])
    .await;
    let provider = provider_at(url);

    assert_eq!(provider.chat(&ChatRequest::new("hello there")).await.unwrap(), "Hello");
    assert_eq!(provider.chat(&ChatRequest::new("more")).await.unwrap(), "again");

    let requests = recorded.lock().unwrap().clone();
    assert_eq!(requests.len(), 3, "token is fetched once");

    assert_eq!(requests[0].path, "/status");
    assert_eq!(requests[0].header("x-vqd-accept"), Some("1"));

    assert_eq!(requests[1].path, "/chat");
    assert_eq!(requests[1].header("x-vqd-4"), Some("tok1"));
    let first = requests[1].json();
    assert_eq!(first["model"], "gpt-4o-mini");
    assert_eq!(first["messages"], json!([{"role": "user", "content": "hello there"}]));

    assert_eq!(requests[2].header("x-vqd-4"), Some("tok2"));
    let second = requests[2].json();
    assert_eq!(
        second["messages"],
        json!([
            {"role": "user", "content": "hello there"},
            {"role": "assistant", "content": "Hello"},
            {"role": "user", "content": "more"}
        ])
    );

    // "hello there": 11 / 4 = 2, plus 2 chunks; "more": 1, plus 1 chunk.
    assert_eq!(provider.estimated_tokens().await, 6);
}

#[tokio::test]
async fn failed_call_leaves_history_unchanged() {
    let (url, recorded) = fake_service(vec![
        Reply::ok("").with_vqd("tok1"),
        Reply {
            status: 403,
            headers: vec![("x-vqd-4", "tok-bad")],
            body: "<html>blocked</html>",
        },
        Reply::ok("data: {\"message\":\"ok\"}\n\ndata: [DONE]\n"),
    ])
    .await;
    let provider = provider_at(url);

    let err = provider.chat(&ChatRequest::new("first try")).await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("403"), "status missing from: {msg}");
    assert!(msg.contains("blocked"));
    assert_eq!(provider.estimated_tokens().await, 0);

    assert_eq!(provider.chat(&ChatRequest::new("retry")).await.unwrap(), "ok");

    let requests = recorded.lock().unwrap().clone();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[2].header("x-vqd-4"), Some("tok1"));
    assert_eq!(
        requests[2].json()["messages"],
        json!([{"role": "user", "content": "retry"}])
    );
}

#[tokio::test]
async fn error_chunk_on_failed_status_is_classified() {
    let (url, _) = fake_service(vec![
        Reply::ok("").with_vqd("tok1"),
        Reply {
            status: 429,
            headers: vec![],
            body: "data: {\"action\":\"error\",\"status\":429,\"type\":\"ERR_CONVERSATION_LIMIT\"}\n\n",
        },
    ])
    .await;
    let provider = provider_at(url);

    let err = provider.chat(&ChatRequest::new("hi")).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<ChatError>(),
        Some(&ChatError::ConversationLimit("ERR_CONVERSATION_LIMIT".to_string()))
    );
}

#[tokio::test]
async fn reply_containing_data_prefix_survives() {
    let (url, _) = fake_service(vec![
        Reply::ok("").with_vqd("tok1"),
        Reply::ok("data: {\"message\":\"use a data: uri\"}\n\ndata: [DONE]\n"),
    ])
    .await;
    let provider = provider_at(url);

    let reply = provider.chat(&ChatRequest::new("how to inline an image")).await.unwrap();
    assert_eq!(reply, "use a data: uri");
}

#[tokio::test]
async fn missing_session_token_fails() {
    let (url, recorded) = fake_service(vec![Reply::ok("")]).await;
    let provider = provider_at(url);

    let err = provider.chat(&ChatRequest::new("hi")).await.unwrap_err();
    assert!(err.to_string().contains("session token"));
    assert_eq!(recorded.lock().unwrap().len(), 1);
}
