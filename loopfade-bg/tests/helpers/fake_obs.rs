//! Minimal obs-websocket v5 server
//!
//! Accepts one session: sends Hello (optionally with an auth challenge),
//! checks the Identify, then answers every request. Each response is preceded
//! by an unrelated event frame so clients must skip events.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

pub const SALT: &str = "lM1GncleQOaCu9lT1yeUZhFYnqhsLLP1G5lAGo3ixaI=";
pub const CHALLENGE: &str = "+IxH4CnCiqpX1rM9scsNynZzbOe4KhDeYcTNS3PDaeY=";

#[derive(Debug, Clone, Default)]
pub struct FakeObsConfig {
    /// Require authentication with this password
    pub password: Option<String>,
    /// Request types answered with `result: false`
    pub rejected: HashSet<String>,
    /// Accept the connection but never send Hello
    pub silent: bool,
}

pub struct FakeObs {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Value>>>,
    task: JoinHandle<()>,
}

fn expected_auth(password: &str) -> String {
    let secret = BASE64.encode(Sha256::digest(format!("{}{}", password, SALT).as_bytes()));
    BASE64.encode(Sha256::digest(format!("{}{}", secret, CHALLENGE).as_bytes()))
}

impl FakeObs {
    pub async fn start(config: FakeObsConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();

        let task = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();

            if config.silent {
                // Hold the socket open without greeting
                while ws.next().await.is_some() {}
                return;
            }

            let mut hello = json!({ "obsWebSocketVersion": "5.0.0", "rpcVersion": 1 });
            if config.password.is_some() {
                hello["authentication"] = json!({ "challenge": CHALLENGE, "salt": SALT });
            }
            ws.send(Message::Text(json!({ "op": 0, "d": hello }).to_string()))
                .await
                .unwrap();

            let identify: Value = match ws.next().await {
                Some(Ok(Message::Text(text))) => serde_json::from_str(&text).unwrap(),
                _ => return,
            };
            assert_eq!(identify["op"], 1);
            if let Some(password) = &config.password {
                if identify["d"]["authentication"].as_str() != Some(expected_auth(password).as_str()) {
                    let _ = ws
                        .send(Message::Close(Some(CloseFrame {
                            code: CloseCode::from(4009),
                            reason: "Authentication failed.".into(),
                        })))
                        .await;
                    return;
                }
            }
            ws.send(Message::Text(
                json!({ "op": 2, "d": { "negotiatedRpcVersion": 1 } }).to_string(),
            ))
            .await
            .unwrap();

            while let Some(Ok(message)) = ws.next().await {
                let Message::Text(text) = message else {
                    continue;
                };
                let frame: Value = serde_json::from_str(&text).unwrap();
                let d = frame["d"].clone();
                seen.lock().unwrap().push(d.clone());

                let request_type = d["requestType"].as_str().unwrap_or_default().to_string();
                let ok = !config.rejected.contains(&request_type);
                let status = if ok {
                    json!({ "result": true, "code": 100 })
                } else {
                    json!({ "result": false, "code": 600, "comment": "No source was found" })
                };

                let event = json!({ "op": 5, "d": { "eventType": "CurrentProgramSceneChanged", "eventIntent": 4 } });
                if ws.send(Message::Text(event.to_string())).await.is_err() {
                    break;
                }
                let response = json!({
                    "op": 7,
                    "d": {
                        "requestType": request_type,
                        "requestId": d["requestId"],
                        "requestStatus": status,
                    }
                });
                if ws.send(Message::Text(response.to_string())).await.is_err() {
                    break;
                }
            }
        });

        Self {
            addr,
            requests,
            task,
        }
    }

    /// `d` payloads of every request received
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}
