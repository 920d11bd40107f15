/*!

# Worker RPC

## Introduction

The worker speaks JSON-RPC 2.0 over a persistent websocket. Requests are
plain JSON text frames; what makes the protocol custom is the response
payload, which wraps the worker's binary return envelope in a hex string.

## Request

```json
{"jsonrpc":"2.0","method":"state_getMetadata","params":[],"id":1}
```

The `id` is used to match requests to responses. Ids are allocated by the
[`dispatcher::RequestDispatcher`] and are unique per in-flight request on a
connection; an id is only reused after the request carrying it has resolved
or timed out.

## Response

```json
{"jsonrpc":"2.0","result":"<hex>","id":1}
```

`result` is the hex encoding of a return envelope:

```bytes
0        status discriminant (0 Ok, 1 TrustedOperationStatus, 2 Error)
1        sub-status discriminant, only when status == 1
..       compact-length-prefixed value bytes
```

See [`crate::envelope`] for the envelope itself and [`crate::codec`] for the
length prefix.

## Correlation and timeouts

Responses may arrive in any order; the dispatcher resumes the awaiting call
whose id matches, not whoever asked first. A timeout cancels only the
awaiting call; the worker is not told to abort, so a late response simply
finds no waiter and is discarded. At most one response per id is expected;
if the worker misbehaves and sends two, the first one wins.

The connection is shared by all concurrent calls and its lifecycle belongs
to whoever opened it; the dispatcher never closes it.

*/
pub mod api_request;
pub mod connection;
pub mod dispatcher;
