use async_trait::async_trait;
use futures::StreamExt;
use reconflow_session::{ChannelError, EventChannel};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;
use url::Url;

/// Event channel backed by a WebSocket connection.
pub struct WsChannel {
  stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
  closed: bool,
}

impl WsChannel {
  pub async fn connect(url: &Url) -> Result<Self, ChannelError> {
    let (stream, _response) = connect_async(url.as_str())
      .await
      .map_err(|e| ChannelError::Connect {
        message: e.to_string(),
      })?;
    debug!(url = %url, "event channel open");
    Ok(Self {
      stream,
      closed: false,
    })
  }
}

#[async_trait]
impl EventChannel for WsChannel {
  async fn recv(&mut self) -> Option<Result<String, ChannelError>> {
    if self.closed {
      return None;
    }
    loop {
      match self.stream.next().await {
        Some(Ok(Message::Text(text))) => return Some(Ok(text)),
        Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
          Ok(text) => return Some(Ok(text)),
          Err(_) => debug!("skipping non-utf8 binary frame"),
        },
        Some(Ok(Message::Close(frame))) => {
          self.closed = true;
          return match frame {
            None => None,
            Some(f) if matches!(f.code, CloseCode::Normal | CloseCode::Away) => None,
            Some(f) => Some(Err(ChannelError::Disconnected {
              message: format!("closed with code {}: {}", u16::from(f.code), f.reason),
            })),
          };
        }
        Some(Ok(_)) => {}
        Some(Err(e)) => {
          self.closed = true;
          return Some(Err(ChannelError::Disconnected {
            message: e.to_string(),
          }));
        }
        None => {
          self.closed = true;
          return None;
        }
      }
    }
  }

  async fn close(&mut self) {
    if self.closed {
      return;
    }
    self.closed = true;
    if let Err(e) = self.stream.close(None).await {
      debug!(error = %e, "event channel close failed");
    }
  }
}
