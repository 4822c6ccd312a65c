use crate::{
    config::prompt::WELCOME_EXAMPLES,
    conversation::{ ConversationController, IgnoreReason },
    generator::ResponseGenerator,
    models::chat::{ ConversationState, InlineData },
    models::websocket::{ ClientMessage, ImageUpload, ServerMessage },
};
use base64::{ engine::general_purpose::STANDARD, Engine as _ };
use chrono::Utc;
use futures::{ Sink, SinkExt, StreamExt };
use log::{ info, warn, error, debug };
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{ AsyncRead, AsyncWrite };
use tokio::sync::mpsc;
use tokio_tungstenite::{
    tungstenite::{ self, protocol::{ Message, WebSocketConfig } },
    WebSocketStream,
};
use uuid::Uuid;

/// Validates an uploaded image. Accepts bare base64 or a `data:` URL.
pub fn decode_image(upload: ImageUpload) -> Result<InlineData, String> {
    let (data, mime_type) = match upload.data.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| "Malformed data URL".to_string())?;
            let header_mime = header.trim_end_matches(";base64");
            let mime = if upload.mime_type.trim().is_empty() {
                header_mime.to_string()
            } else {
                upload.mime_type
            };
            (payload.to_string(), mime)
        }
        None => (upload.data, upload.mime_type),
    };

    let mime_type = mime_type.trim().to_string();
    if !mime_type.starts_with("image/") {
        return Err(format!("Unsupported image type '{}'", mime_type));
    }
    if data.is_empty() {
        return Err("Image payload is empty".to_string());
    }
    STANDARD.decode(&data).map_err(|e| format!("Image payload is not valid base64: {}", e))?;

    Ok(InlineData::new(data, mime_type))
}

/// Protocol limits matching the application-level size check, so oversize
/// input is refused while reading instead of after buffering.
pub fn ws_config(max_message_size: usize) -> WebSocketConfig {
    WebSocketConfig {
        max_message_size: Some(max_message_size),
        max_frame_size: Some(max_message_size),
        ..Default::default()
    }
}

fn too_large() -> ServerMessage {
    ServerMessage::Error { message: "Message too large".to_string() }
}

fn ignored_notice(reason: IgnoreReason) -> ServerMessage {
    let message = match reason {
        IgnoreReason::Busy => "A response is still being generated",
        IgnoreReason::Empty => "Message must contain text or an image",
    };
    ServerMessage::Error { message: message.to_string() }
}

fn state_frame(state: ConversationState) -> ServerMessage {
    ServerMessage::State {
        messages: state.messages,
        busy: state.busy,
        timestamp: Utc::now().timestamp(),
    }
}

async fn send_frame<S>(tx: &mut S, frame: &ServerMessage) -> Result<(), tungstenite::Error>
    where S: Sink<Message, Error = tungstenite::Error> + Unpin
{
    let json = serde_json
        ::to_string(frame)
        .map_err(|e| tungstenite::Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    tx.send(Message::Text(json)).await
}

pub async fn handle_connection<S>(
    peer: SocketAddr,
    websocket: WebSocketStream<S>,
    generator: ResponseGenerator,
    max_message_size: usize
)
    where S: AsyncRead + AsyncWrite + Unpin
{
    let (mut tx, mut rx) = websocket.split();
    let conversation_id = Uuid::new_v4().to_string();
    info!("Assigned conversation ID {} to {}", conversation_id, peer);

    let controller = Arc::new(ConversationController::new(generator));
    let (out_tx, mut out_rx) = mpsc::channel::<ServerMessage>(32);

    // Follows later state changes; the accepted (busy) state is sent directly
    // below since the watch channel may coalesce it with a fast reply.
    let mut state_rx = controller.subscribe();
    let watcher = tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let snapshot = state_rx.borrow_and_update().clone();
            if out_tx.send(state_frame(snapshot)).await.is_err() {
                break;
            }
        }
    });

    let welcome = ServerMessage::Welcome {
        examples: WELCOME_EXAMPLES.iter().map(|s| s.to_string()).collect(),
    };
    if let Err(e) = send_frame(&mut tx, &welcome).await {
        error!("Error sending welcome to {}: {}", peer, e);
        watcher.abort();
        return;
    }

    loop {
        tokio::select! {
            outgoing = out_rx.recv() => {
                let Some(frame) = outgoing else { break };
                if let Err(e) = send_frame(&mut tx, &frame).await {
                    error!("Error sending message to {}: {}", peer, e);
                    break;
                }
            }
            incoming = rx.next() => {
                let Some(msg) = incoming else { break };
                let message = match msg {
                    Ok(message) => message,
                    Err(e) => {
                        match e {
                            | tungstenite::Error::ConnectionClosed
                            | tungstenite::Error::Protocol(_)
                            | tungstenite::Error::Utf8 => {
                                info!("WebSocket connection closed or protocol error for {}: {}", peer, e);
                            }
                            tungstenite::Error::Capacity(ref cap_err) => {
                                warn!("WebSocket capacity error for {}: {}", peer, cap_err);
                                if send_frame(&mut tx, &too_large()).await.is_err() {
                                    error!("Failed to send size limit error to {}", peer);
                                }
                            }
                            tungstenite::Error::Io(ref io_err) if
                                io_err.kind() == std::io::ErrorKind::ConnectionReset
                            => {
                                info!("WebSocket connection reset by peer {}", peer);
                            }
                            _ => {
                                error!("Error receiving message from {}: {}", peer, e);
                            }
                        }
                        break;
                    }
                };

                if message.len() > max_message_size {
                    warn!(
                        "Message from {} exceeds size limit ({} > {})",
                        peer,
                        message.len(),
                        max_message_size
                    );
                    if send_frame(&mut tx, &too_large()).await.is_err() {
                        error!("Failed to send size limit error to {}", peer);
                    }
                    break;
                }

                match message {
                    Message::Text(text) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Chat { content, image }) => {
                                let image = match image.map(decode_image).transpose() {
                                    Ok(image) => image,
                                    Err(reason) => {
                                        warn!("Rejected image from {}: {}", peer, reason);
                                        let error_msg = ServerMessage::Error { message: reason };
                                        if send_frame(&mut tx, &error_msg).await.is_err() {
                                            break;
                                        }
                                        continue;
                                    }
                                };

                                let turn = match controller.accept(&content, image) {
                                    Ok(turn) => turn,
                                    Err(reason) => {
                                        if send_frame(&mut tx, &ignored_notice(reason)).await.is_err() {
                                            break;
                                        }
                                        continue;
                                    }
                                };
                                let accepted = state_frame(controller.snapshot());

                                let worker = Arc::clone(&controller);
                                let conv_id = conversation_id.clone();
                                tokio::spawn(async move {
                                    worker.complete(turn).await;
                                    debug!("Conversation {} turn completed", conv_id);
                                });

                                if let Err(e) = send_frame(&mut tx, &accepted).await {
                                    error!("Error sending state to {}: {}", peer, e);
                                    break;
                                }
                            }
                            Err(e) => {
                                error!("Failed to parse message from {}: {}", peer, e);
                                let error_msg = ServerMessage::Error {
                                    message: format!("Failed to parse message: {}", e),
                                };
                                if let Err(e) = send_frame(&mut tx, &error_msg).await {
                                    error!("Error sending parse error to {}: {}", peer, e);
                                    break;
                                }
                            }
                        }
                    }
                    Message::Close(_) => {
                        info!("Received close frame from {}", peer);
                        break;
                    }
                    Message::Ping(ping_data) => {
                        if tx.send(Message::Pong(ping_data)).await.is_err() {
                            error!("Failed to send pong to {}", peer);
                            break;
                        }
                    }
                    Message::Pong(_) => {}
                    Message::Binary(_) => {
                        warn!("Ignoring binary message from {}", peer);
                    }
                    Message::Frame(_) => {}
                }
            }
        }
    }

    watcher.abort();
    info!("WebSocket connection closed for {} (Conv ID: {})", peer, conversation_id);
}
