use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::envelope::RpcReturnValue;
use crate::error::Error;
use crate::rpc::api_request::{RpcRequest, RpcResponse};
use crate::Result;

/// Matches responses to in-flight requests on one connection.
///
/// Each dispatcher instance is bound to exactly one connection: outbound
/// frames go into the channel handed to [`RequestDispatcher::new`], inbound
/// frames come back through [`RequestDispatcher::dispatch_response`]. There
/// is no shared global state; two connections mean two dispatchers.
pub struct RequestDispatcher {
    outbound: mpsc::UnboundedSender<String>,
    pending: Mutex<HashMap<u32, oneshot::Sender<RpcResponse>>>,
    next_request_id: AtomicU32,
}

impl RequestDispatcher {
    pub fn new(outbound: mpsc::UnboundedSender<String>) -> RequestDispatcher {
        RequestDispatcher {
            outbound,
            pending: Mutex::new(HashMap::new()),
            next_request_id: AtomicU32::new(1),
        }
    }

    /// Send one request and suspend until the matching response arrives or
    /// the window elapses. Exactly one frame goes out per call; nothing is
    /// retried here. A timed-out call deregisters its waiter, so a late
    /// response is observed by [`RequestDispatcher::dispatch_response`] and
    /// discarded there.
    pub async fn send_request(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
        request_timeout: Duration,
    ) -> Result<RpcReturnValue> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let frame = serde_json::to_string(&RpcRequest::new(method, params, request_id))?;

        let (response_sender, response_receiver) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(request_id, response_sender);
        }

        if self.outbound.send(frame).is_err() {
            self.pending.lock().await.remove(&request_id);
            return Err(Error::ConnectionClosed);
        }
        debug!("request {} ({}) sent", request_id, method);

        match timeout(request_timeout, response_receiver).await {
            Ok(Ok(response)) => RpcReturnValue::from_hex(&response.result),
            // waiter dropped without a response: the connection went away
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                self.pending.lock().await.remove(&request_id);
                debug!(
                    "request {} timed out after {:?}, late responses will be discarded",
                    request_id, request_timeout
                );
                Err(Error::RequestTimedOut)
            }
        }
    }

    /// Route one inbound text frame to its waiter. Frames that do not parse,
    /// carry an unknown id, or arrive after their call timed out are logged
    /// and dropped; they never affect other in-flight requests. A duplicate
    /// response for an id resolves first-match-wins.
    pub async fn dispatch_response(&self, frame: &str) {
        let response: RpcResponse = match serde_json::from_str(frame) {
            Ok(response) => response,
            Err(error) => {
                warn!("dropping unparseable response frame: {}", error);
                return;
            }
        };

        let waiter = self.pending.lock().await.remove(&response.id);
        match waiter {
            Some(response_sender) => {
                if response_sender.send(response).is_err() {
                    debug!("waiter gone before response could be delivered");
                }
            }
            None => {
                debug!(
                    "discarding response for unknown or timed-out request id {}",
                    response.id
                );
            }
        }
    }

    /// Fail every outstanding request. Called by the connection's read task
    /// when the socket ends so waiters resolve immediately instead of
    /// running out their timeouts.
    pub async fn abort_pending(&self) {
        let mut pending = self.pending.lock().await;
        if !pending.is_empty() {
            warn!("failing {} in-flight requests", pending.len());
        }
        pending.clear();
    }

    /// Number of requests currently awaiting a response.
    pub async fn pending_requests(&self) -> usize {
        self.pending.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::DirectRequestStatus;
    use crate::rpc::api_request::JSON_RPC_VERSION;
    use std::sync::Arc;

    fn ok_response_frame(request_id: u32, payload: &[u8]) -> String {
        let envelope = RpcReturnValue::new(DirectRequestStatus::Ok, payload.to_vec());
        let response = RpcResponse {
            jsonrpc: String::from(JSON_RPC_VERSION),
            result: hex::encode(envelope.encode()),
            id: request_id,
        };
        serde_json::to_string(&response).unwrap()
    }

    #[tokio::test]
    async fn test_out_of_order_responses_resolve_by_id() {
        let (outbound_sender, mut outbound_receiver) = mpsc::unbounded_channel();
        let dispatcher = Arc::new(RequestDispatcher::new(outbound_sender));

        let first_dispatcher = dispatcher.clone();
        let first = tokio::spawn(async move {
            first_dispatcher
                .send_request("first_method", vec![], Duration::from_secs(5))
                .await
        });
        let second_dispatcher = dispatcher.clone();
        let second = tokio::spawn(async move {
            second_dispatcher
                .send_request("second_method", vec![], Duration::from_secs(5))
                .await
        });

        let mut requests_by_method = HashMap::new();
        for _ in 0..2 {
            let frame = outbound_receiver.recv().await.unwrap();
            let request: RpcRequest = serde_json::from_str(&frame).unwrap();
            requests_by_method.insert(request.method.clone(), request);
        }
        let first_id = requests_by_method.get("first_method").unwrap().id;
        let second_id = requests_by_method.get("second_method").unwrap().id;
        assert_ne!(first_id, second_id);

        // deliver in reverse order of submission
        dispatcher
            .dispatch_response(&ok_response_frame(second_id, b"second payload"))
            .await;
        dispatcher
            .dispatch_response(&ok_response_frame(first_id, b"first payload"))
            .await;

        let first_envelope = first.await.unwrap().unwrap();
        let second_envelope = second.await.unwrap().unwrap();
        assert_eq!(first_envelope.value, b"first payload");
        assert_eq!(second_envelope.value, b"second payload");
    }

    #[tokio::test]
    async fn test_timeout_deregisters_waiter() {
        let (outbound_sender, mut outbound_receiver) = mpsc::unbounded_channel();
        let dispatcher = RequestDispatcher::new(outbound_sender);

        let result = dispatcher
            .send_request("never_answered", vec![], Duration::from_millis(1))
            .await;
        assert!(matches!(result, Err(Error::RequestTimedOut)));
        assert_eq!(dispatcher.pending_requests().await, 0);

        // a late response finds no waiter and is silently discarded
        let frame = outbound_receiver.recv().await.unwrap();
        let request: RpcRequest = serde_json::from_str(&frame).unwrap();
        dispatcher
            .dispatch_response(&ok_response_frame(request.id, b"late"))
            .await;
        assert_eq!(dispatcher.pending_requests().await, 0);
    }

    #[tokio::test]
    async fn test_send_on_closed_connection() {
        let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel();
        drop(outbound_receiver);
        let dispatcher = RequestDispatcher::new(outbound_sender);

        let result = dispatcher
            .send_request("state_getMetadata", vec![], Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(Error::ConnectionClosed)));
        assert_eq!(dispatcher.pending_requests().await, 0);
    }

    #[tokio::test]
    async fn test_abort_pending_fails_waiters() {
        let (outbound_sender, mut outbound_receiver) = mpsc::unbounded_channel();
        let dispatcher = Arc::new(RequestDispatcher::new(outbound_sender));

        let waiting_dispatcher = dispatcher.clone();
        let waiting = tokio::spawn(async move {
            waiting_dispatcher
                .send_request("state_getMetadata", vec![], Duration::from_secs(5))
                .await
        });

        // request is on the wire before we tear the connection down
        let _frame = outbound_receiver.recv().await.unwrap();
        dispatcher.abort_pending().await;

        let result = waiting.await.unwrap();
        assert!(matches!(result, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_unparseable_frame_is_dropped() {
        let (outbound_sender, _outbound_receiver) = mpsc::unbounded_channel();
        let dispatcher = RequestDispatcher::new(outbound_sender);
        dispatcher.dispatch_response("not json at all").await;
        assert_eq!(dispatcher.pending_requests().await, 0);
    }

    #[tokio::test]
    async fn test_error_status_envelope_is_returned_not_raised() {
        let (outbound_sender, mut outbound_receiver) = mpsc::unbounded_channel();
        let dispatcher = Arc::new(RequestDispatcher::new(outbound_sender));

        let sending_dispatcher = dispatcher.clone();
        let sending = tokio::spawn(async move {
            sending_dispatcher
                .send_request("state_getStorage", vec![], Duration::from_secs(5))
                .await
        });

        let frame = outbound_receiver.recv().await.unwrap();
        let request: RpcRequest = serde_json::from_str(&frame).unwrap();
        let envelope = RpcReturnValue::new(
            DirectRequestStatus::Error,
            crate::codec::compact_add_length(b"not found"),
        );
        let response = RpcResponse {
            jsonrpc: String::from(JSON_RPC_VERSION),
            result: hex::encode(envelope.encode()),
            id: request.id,
        };
        dispatcher
            .dispatch_response(&serde_json::to_string(&response).unwrap())
            .await;

        let returned = sending.await.unwrap().unwrap();
        assert!(returned.is_error());
        assert_eq!(returned.error_message().unwrap(), "not found");
    }
}
