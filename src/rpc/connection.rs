use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite};
use tracing::{debug, error, info};
use url::Url;

use crate::error::Error;
use crate::rpc::dispatcher::RequestDispatcher;
use crate::Result;

/// One websocket connection to a worker, with its dispatcher.
///
/// Two tasks are spawned per connection: one forwarding the dispatcher's
/// outbound frames into the socket sink, one feeding inbound text frames
/// back to the dispatcher. Lifecycle belongs to the caller that connected;
/// dropping the `WorkerConnection` (and every dispatcher handle) lets both
/// tasks wind down.
pub struct WorkerConnection {
    url: Url,
    dispatcher: Arc<RequestDispatcher>,
}

impl WorkerConnection {
    /// Open a websocket to the worker at `url` and wire up a dispatcher.
    pub async fn connect(url: &str) -> Result<WorkerConnection> {
        let url = Url::parse(url).map_err(|parse_error| Error::Transport(parse_error.to_string()))?;
        let (ws_stream, _) = connect_async(url.clone())
            .await
            .map_err(|connect_error| Error::Transport(connect_error.to_string()))?;
        info!("connected to worker at {}", url);

        let (mut write_sink, mut read_stream) = ws_stream.split();
        let (outbound_sender, mut outbound_receiver) = mpsc::unbounded_channel::<String>();
        let dispatcher = Arc::new(RequestDispatcher::new(outbound_sender));

        tokio::spawn(async move {
            while let Some(frame) = outbound_receiver.recv().await {
                if let Err(write_error) = write_sink.send(tungstenite::Message::Text(frame)).await {
                    error!("error writing to worker socket: {}", write_error);
                    break;
                }
            }
            debug!("outbound forwarding task finished");
        });

        let read_dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            while let Some(frame_result) = read_stream.next().await {
                match frame_result {
                    Ok(message) => {
                        if !message.is_text() {
                            continue;
                        }
                        match message.into_text() {
                            Ok(text) => read_dispatcher.dispatch_response(&text).await,
                            Err(text_error) => {
                                error!("non-utf8 text frame from worker: {}", text_error)
                            }
                        }
                    }
                    Err(read_error) => {
                        error!("error reading from worker socket: {}", read_error);
                        break;
                    }
                }
            }
            info!("worker socket closed");
            read_dispatcher.abort_pending().await;
        });

        Ok(WorkerConnection { url, dispatcher })
    }

    /// A handle for issuing requests on this connection. Handles may be
    /// cloned freely; all of them share one id space and one socket.
    pub fn dispatcher(&self) -> Arc<RequestDispatcher> {
        self.dispatcher.clone()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}
