//! OBS Studio control over obs-websocket v5
//!
//! One WebSocket session, one request in flight at a time. Each request waits
//! for the `RequestResponse` carrying its id; events and unrelated frames that
//! arrive in between are discarded.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use super::protocol::{self, op, request_type, Frame, Hello, Identified, RequestResponse};
use super::{ControlChannel, MediaOptions, SceneControl};
use crate::error::{CommandError, ConnectionError};
use crate::playback::MediaReference;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection settings for one OBS instance
#[derive(Debug, Clone)]
pub struct ObsSettings {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ObsSettings {
    /// `ws://host:port`
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}

impl Default for ObsSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 4455,
            password: None,
            connect_timeout: Duration::from_millis(5000),
            request_timeout: Duration::from_millis(5000),
        }
    }
}

/// Identified obs-websocket session
pub struct ObsClient {
    stream: WsStream,
    request_timeout: Duration,
    filter_name: String,
    next_request_id: u64,
    session_id: uuid::Uuid,
}

impl ObsClient {
    /// Open the WebSocket and complete the Hello/Identify handshake.
    ///
    /// `filter_name` is the colour filter on each layer source whose `opacity`
    /// setting drives the crossfade.
    pub async fn connect(settings: &ObsSettings, filter_name: &str) -> Result<Self, ConnectionError> {
        let url = settings.url();
        info!("Connecting to OBS at {}", url);

        let (mut stream, _) = tokio::time::timeout(settings.connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| ConnectionError::Timeout(settings.connect_timeout))?
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;

        let rpc_version = tokio::time::timeout(
            settings.connect_timeout,
            Self::handshake(&mut stream, settings.password.as_deref()),
        )
        .await
        .map_err(|_| ConnectionError::Timeout(settings.connect_timeout))??;

        let session_id = uuid::Uuid::new_v4();
        info!(
            "Connected to OBS (rpc version {}, session {})",
            rpc_version, session_id
        );

        Ok(Self {
            stream,
            request_timeout: settings.request_timeout,
            filter_name: filter_name.to_string(),
            next_request_id: 0,
            session_id,
        })
    }

    async fn handshake(stream: &mut WsStream, password: Option<&str>) -> Result<u32, ConnectionError> {
        let hello_frame = Self::read_handshake_frame(stream).await?;
        if hello_frame.op != op::HELLO {
            return Err(ConnectionError::Handshake(format!(
                "expected Hello (op {}), got op {}",
                op::HELLO,
                hello_frame.op
            )));
        }
        let hello: Hello = hello_frame
            .body()
            .map_err(|e| ConnectionError::Handshake(format!("invalid Hello: {}", e)))?;
        debug!(
            "OBS Hello: obs-websocket {}, rpc version {}",
            hello.obs_web_socket_version.as_deref().unwrap_or("unknown"),
            hello.rpc_version
        );

        let authentication = match (&hello.authentication, password) {
            (Some(challenge), Some(password)) => Some(protocol::auth_response(password, challenge)),
            (Some(_), None) => return Err(ConnectionError::PasswordRequired),
            (None, Some(_)) => {
                warn!("OBS does not require authentication; ignoring configured password");
                None
            }
            (None, None) => None,
        };

        let identify = Frame::identify(authentication)
            .and_then(|frame| frame.to_text())
            .map_err(|e| ConnectionError::Handshake(e.to_string()))?;
        stream
            .send(Message::Text(identify))
            .await
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;

        let identified_frame = Self::read_handshake_frame(stream).await?;
        if identified_frame.op != op::IDENTIFIED {
            return Err(ConnectionError::Handshake(format!(
                "expected Identified (op {}), got op {}",
                op::IDENTIFIED,
                identified_frame.op
            )));
        }
        let identified: Identified = identified_frame
            .body()
            .map_err(|e| ConnectionError::Handshake(format!("invalid Identified: {}", e)))?;

        Ok(identified.negotiated_rpc_version)
    }

    async fn read_handshake_frame(stream: &mut WsStream) -> Result<Frame, ConnectionError> {
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Frame::parse(&text)
                        .map_err(|e| ConnectionError::Handshake(format!("invalid frame: {}", e)));
                }
                Some(Ok(Message::Close(frame))) => {
                    // obs-websocket reports auth failure as close code 4009 with a reason
                    return Err(ConnectionError::Closed(frame.map(|f| f.reason.to_string())));
                }
                None => return Err(ConnectionError::Closed(None)),
                Some(Err(e)) => return Err(ConnectionError::Transport(e.to_string())),
                Some(Ok(_)) => continue, // ping/pong/binary
            }
        }
    }

    /// Send one request and wait for its response data.
    pub async fn request(&mut self, request_type: &str, data: Value) -> Result<Option<Value>, CommandError> {
        self.next_request_id += 1;
        let request_id = format!("{}-{}", self.session_id, self.next_request_id);

        let text = Frame::request(request_type, &request_id, data)
            .to_text()
            .map_err(|e| CommandError::Protocol(e.to_string()))?;

        let timeout = self.request_timeout;
        let response = tokio::time::timeout(timeout, async {
            self.stream
                .send(Message::Text(text))
                .await
                .map_err(|e| CommandError::Transport(e.to_string()))?;
            self.await_response(&request_id).await
        })
        .await
        .map_err(|_| CommandError::Timeout {
            request_type: request_type.to_string(),
            timeout,
        })??;

        if response.request_status.result {
            trace!("{} {} ok", request_type, request_id);
            Ok(response.response_data)
        } else {
            Err(CommandError::Rejected {
                request_type: response.request_type,
                code: response.request_status.code,
                comment: response.request_status.comment,
            })
        }
    }

    async fn await_response(&mut self, request_id: &str) -> Result<RequestResponse, CommandError> {
        loop {
            let text = match self.stream.next().await {
                Some(Ok(Message::Text(text))) => text,
                Some(Ok(Message::Close(frame))) => {
                    return Err(CommandError::Transport(format!(
                        "connection closed{}",
                        frame.map(|f| format!(": {}", f.reason)).unwrap_or_default()
                    )));
                }
                None => return Err(CommandError::Transport("connection closed".to_string())),
                Some(Err(e)) => return Err(CommandError::Transport(e.to_string())),
                Some(Ok(_)) => continue,
            };

            let frame = Frame::parse(&text).map_err(|e| CommandError::Protocol(e.to_string()))?;
            match frame.op {
                op::REQUEST_RESPONSE => {
                    let response: RequestResponse = frame
                        .body()
                        .map_err(|e| CommandError::Protocol(e.to_string()))?;
                    if response.request_id == request_id {
                        return Ok(response);
                    }
                    debug!("Discarding response for stale request {}", response.request_id);
                }
                op::EVENT => continue,
                other => trace!("Ignoring frame with op {}", other),
            }
        }
    }

    /// Close the session
    pub async fn close(mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!("Error closing OBS session: {}", e);
        }
    }
}

#[async_trait]
impl ControlChannel for ObsClient {
    async fn set_source_media(
        &mut self,
        source: &str,
        media: &MediaReference,
        options: MediaOptions,
    ) -> Result<(), CommandError> {
        let data = protocol::set_input_settings(source, media, options);
        self.request(request_type::SET_INPUT_SETTINGS, data).await?;
        debug!("Updated video source {} to {}", source, media);
        Ok(())
    }

    async fn set_source_opacity(&mut self, source: &str, opacity: f64) -> Result<(), CommandError> {
        let data = protocol::set_filter_opacity(source, &self.filter_name, opacity);
        self.request(request_type::SET_SOURCE_FILTER_SETTINGS, data).await?;
        trace!("Set opacity of {} to {}", source, opacity);
        Ok(())
    }
}

#[async_trait]
impl SceneControl for ObsClient {
    async fn set_scene_transition(&mut self, transition: &str) -> Result<(), CommandError> {
        let data = serde_json::json!({ "transitionName": transition });
        self.request(request_type::SET_CURRENT_SCENE_TRANSITION, data).await?;
        Ok(())
    }

    async fn set_program_scene(&mut self, scene: &str) -> Result<(), CommandError> {
        let data = serde_json::json!({ "sceneName": scene });
        self.request(request_type::SET_CURRENT_PROGRAM_SCENE, data).await?;
        Ok(())
    }
}
