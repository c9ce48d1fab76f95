use std::{net::SocketAddr, sync::Arc};

use application::{Clock, ManualClock, MemoryMessageRepository, MemoryParticipantRepository};
use chrono::Duration;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tokio::{net::TcpListener, sync::oneshot};
use web_api::{router, AppState};

pub const TIMEOUT_SECS: i64 = 10;

/// 真实监听端口的测试服务：内存存储 + 手动时钟
pub struct TestApp {
    pub base_url: String,
    pub client: Client,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let clock = Arc::new(ManualClock::default());
        let state = AppState::new(
            Arc::new(MemoryParticipantRepository::new()),
            Arc::new(MemoryMessageRepository::new()),
            clock.clone() as Arc<dyn Clock>,
            Duration::seconds(TIMEOUT_SECS),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr: SocketAddr = listener.local_addr().expect("addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = router(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Self {
            base_url: format!("http://{addr}"),
            client: Client::new(),
            state,
            clock,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn as_user(&self, builder: RequestBuilder, user: &str) -> RequestBuilder {
        builder.header("User", user)
    }

    pub async fn join(&self, name: &str) -> Response {
        self.client
            .post(self.url("/participants"))
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .expect("join request")
    }

    pub async fn post_message(&self, from: &str, to: &str, text: &str, kind: &str) -> Response {
        self.as_user(self.client.post(self.url("/messages")), from)
            .json(&serde_json::json!({ "to": to, "text": text, "type": kind }))
            .send()
            .await
            .expect("post message request")
    }

    pub async fn messages_for(&self, user: &str) -> Vec<Value> {
        let response = self
            .as_user(self.client.get(self.url("/messages")), user)
            .send()
            .await
            .expect("list messages request");
        assert_eq!(response.status(), 200);
        response.json().await.expect("messages json")
    }

    pub async fn heartbeat(&self, user: &str) -> Response {
        self.as_user(self.client.post(self.url("/status")), user)
            .send()
            .await
            .expect("status request")
    }

    pub async fn participant_names(&self, query: &str) -> Vec<String> {
        let participants: Vec<Value> = self
            .client
            .get(self.url(&format!("/participants{query}")))
            .send()
            .await
            .expect("list participants request")
            .json()
            .await
            .expect("participants json");
        participants
            .iter()
            .map(|p| p["name"].as_str().expect("name").to_owned())
            .collect()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// 把消息列表压缩成 (from, to, text) 便于断言
pub fn summarize(messages: &[Value]) -> Vec<(String, String, String)> {
    messages
        .iter()
        .map(|m| {
            (
                m["from"].as_str().unwrap_or_default().to_owned(),
                m["to"].as_str().unwrap_or_default().to_owned(),
                m["text"].as_str().unwrap_or_default().to_owned(),
            )
        })
        .collect()
}

pub fn row(from: &str, to: &str, text: &str) -> (String, String, String) {
    (from.to_owned(), to.to_owned(), text.to_owned())
}
