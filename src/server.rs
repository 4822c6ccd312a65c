use crate::generator::ResponseGenerator;
use crate::websocket::{ handle_connection, ws_config };
use std::error::Error;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::io::{ AsyncRead, AsyncWrite };
use tokio_tungstenite::accept_hdr_async_with_config;
use tokio_tungstenite::tungstenite::handshake::server::{ Request, Response };
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::http::response::Response as HttpResponse;

use log::{ info, warn, error, debug };

pub struct Server {
    addr: String,
    generator: ResponseGenerator,
    api_key: Option<String>,
    max_message_size: usize,
}

/// Pulls the client key from the `X-API-Key` header or the `api_key` query parameter.
fn provided_api_key(req: &Request) -> Option<String> {
    let from_header = req
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    if from_header.is_some() {
        return from_header;
    }

    req.uri()
        .query()?
        .split('&')
        .find_map(|pair| {
            let mut kv = pair.splitn(2, '=');
            match (kv.next(), kv.next()) {
                (Some("api_key"), Some(value)) => Some(value.to_string()),
                _ => None,
            }
        })
}

fn is_authorized(req: &Request, required_api_key: Option<&str>) -> bool {
    match required_api_key {
        Some(required) => provided_api_key(req).as_deref() == Some(required),
        None => true,
    }
}

impl Server {
    pub fn new(
        addr: String,
        generator: ResponseGenerator,
        api_key: Option<String>,
        max_message_size: usize
    ) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());

        if api_key.is_some() {
            info!("Server configured with API Key authentication.");
        } else {
            warn!("Server configured WITHOUT API Key authentication. Connections are open.");
        }

        Self { addr, generator, api_key, max_message_size }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let listener = TcpListener::bind(&self.addr).await?;
        info!("WS server listening on: {}", self.addr);

        loop {
            let (stream, peer) = listener.accept().await?;
            info!("Incoming connection from: {}", peer);

            let generator = self.generator.clone();
            let required_api_key = self.api_key.clone();
            let max_message_size = self.max_message_size;

            tokio::spawn(async move {
                if
                    let Err(e) = Self::process_connection(
                        peer,
                        stream,
                        generator,
                        required_api_key,
                        max_message_size
                    ).await
                {
                    error!("Failed to process connection for {}: {}", peer, e);
                }
            });
        }
    }

    async fn process_connection<S>(
        peer: SocketAddr,
        stream: S,
        generator: ResponseGenerator,
        required_api_key: Option<String>,
        max_message_size: usize
    ) -> Result<(), Box<dyn Error + Send + Sync>>
        where S: AsyncRead + AsyncWrite + Unpin + Send + 'static
    {
        let auth_callback = |
            req: &Request,
            response: Response
        | -> Result<Response, HttpResponse<Option<String>>> {
            debug!("Handshake from {}", peer);

            if !is_authorized(req, required_api_key.as_deref()) {
                warn!("{}: bad or missing API key", peer);
                let mut resp = HttpResponse::new(Some("Unauthorized".to_string()));
                *resp.status_mut() = StatusCode::UNAUTHORIZED;
                return Err(resp);
            }

            Ok(response)
        };

        match
            accept_hdr_async_with_config(
                stream,
                auth_callback,
                Some(ws_config(max_message_size))
            ).await
        {
            Ok(ws) => {
                handle_connection(peer, ws, generator, max_message_size).await;
                Ok(())
            }
            Err(e) => {
                error!("Handshake failed for {}: {}", peer, e);
                Err(Box::new(e) as _)
            }
        }
    }
}
