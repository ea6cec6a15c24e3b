use std::{net::SocketAddr, time::Duration};

use llm_gateway::{
    error::ServiceResult,
    server::{ServerConfig, serve},
};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;

struct TestGateway {
    addr: SocketAddr,
    shutdown: CancellationToken,
    handle: JoinHandle<ServiceResult<()>>,
}

impl TestGateway {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let config = ServerConfig {
            read_timeout: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(5),
        };
        let handle = tokio::spawn(serve(listener, config, shutdown.clone()));
        Self {
            addr,
            shutdown,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    async fn stop(self) {
        self.shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
    }
}

/// Status, content type and body of a finished exchange.
type Exchange = (u16, String, String);

fn finish(result: Result<ureq::Response, ureq::Error>) -> Exchange {
    let response = match result {
        Ok(response) => response,
        Err(ureq::Error::Status(_, response)) => response,
        Err(err) => panic!("transport error: {err}"),
    };
    let status = response.status();
    let content_type = response.header("Content-Type").unwrap_or_default().to_string();
    (status, content_type, response.into_string().unwrap())
}

async fn send(
    method: &'static str,
    url: String,
    content_type: Option<&'static str>,
    body: String,
) -> Exchange {
    tokio::task::spawn_blocking(move || {
        let mut request = ureq::request(method, &url);
        if let Some(content_type) = content_type {
            request = request.set("Content-Type", content_type);
        }
        if body.is_empty() {
            finish(request.call())
        } else {
            finish(request.send_string(&body))
        }
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn chat_round_trip() {
    let gateway = TestGateway::start().await;

    let (status, content_type, body) = send(
        "POST",
        gateway.url("/chat"),
        Some("application/json"),
        r#"{"model":"gpt-4","message":"Hello World"}"#.to_string(),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(content_type, "application/json");
    assert_eq!(
        body,
        r#"{"status":"success","reply":"Echo: Hello World","model":"gpt-4"}"#
    );

    let (status, _, body) = send(
        "POST",
        gateway.url("/chat"),
        Some("application/json"),
        r#"{"model":"gpt-4","message":"Hello \"quoted\"\nline"}"#.to_string(),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(
        body,
        r#"{"status":"success","reply":"Echo: Hello \"quoted\"\nline","model":"gpt-4"}"#
    );

    gateway.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn chat_rejections() {
    let gateway = TestGateway::start().await;

    let (status, _, body) = send("GET", gateway.url("/chat"), None, String::new()).await;
    assert_eq!(status, 405);
    assert_eq!(body, r#"{"error":"Method Not Allowed"}"#);

    let (status, _, body) = send(
        "POST",
        gateway.url("/chat"),
        Some("text/plain"),
        r#"{"model":"gpt-4","message":"Hello"}"#.to_string(),
    )
    .await;
    assert_eq!(status, 415);
    assert_eq!(body, r#"{"error":"Content-Type must be application/json"}"#);

    let (status, _, body) = send(
        "POST",
        gateway.url("/chat"),
        Some("application/json"),
        "{invalid json}".to_string(),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body, r#"{"error":"Missing or invalid model field"}"#);

    let (status, _, body) = send(
        "POST",
        gateway.url("/chat"),
        Some("application/json"),
        r#"{"model":"gpt-4","message":""}"#.to_string(),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body, r#"{"error":"Model and message are required"}"#);

    let (status, _, body) = send(
        "POST",
        gateway.url("/chat"),
        Some("application/json"),
        String::new(),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body, r#"{"error":"Request body is required"}"#);

    gateway.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn static_endpoints_and_fallback() {
    let gateway = TestGateway::start().await;

    let (status, content_type, body) =
        send("GET", gateway.url("/health"), None, String::new()).await;
    assert_eq!(status, 200);
    assert_eq!(content_type, "application/json");
    assert_eq!(body, r#"{"status":"healthy"}"#);

    let (status, _, body) = send("GET", gateway.url("/"), None, String::new()).await;
    assert_eq!(status, 200);
    assert_eq!(body, r#"{"message":"LLM Gateway API","version":"1.0.0"}"#);

    let (status, content_type, body) =
        send("GET", gateway.url("/does-not-exist"), None, String::new()).await;
    assert_eq!(status, 404);
    assert_eq!(content_type, "application/json");
    assert_eq!(body, r#"{"error":"Not Found"}"#);

    gateway.stop().await;
}
