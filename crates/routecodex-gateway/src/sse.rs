use std::convert::Infallible;

use axum::body::Body;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;
use futures_util::StreamExt;
use routecodex_transform::StreamFormat;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Wraps an already wire-framed chunk channel (each `String` produced by
/// a `StreamTransformer` is a complete SSE frame) into an axum streaming
/// response with no-buffering SSE headers.
pub fn sse_response(format: StreamFormat, chunks: mpsc::Receiver<String>) -> Response {
    tracing::debug!(?format, "streaming sse response");
    let stream = ReceiverStream::new(chunks).map(|chunk| Ok::<_, Infallible>(chunk.into_bytes()));
    let mut resp = Response::new(Body::from_stream(stream));
    *resp.status_mut() = StatusCode::OK;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    resp.headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    resp.headers_mut().insert(
        "x-accel-buffering",
        HeaderValue::from_static("no"),
    );
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sets_no_buffering_headers() {
        let (_tx, rx) = mpsc::channel(1);
        let resp = sse_response(StreamFormat::SseDataOnly, rx);
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(CONTENT_TYPE).unwrap(), "text/event-stream");
        assert_eq!(resp.headers().get(CACHE_CONTROL).unwrap(), "no-cache");
        assert_eq!(resp.headers().get("x-accel-buffering").unwrap(), "no");
    }

    #[tokio::test]
    async fn streams_frames_in_order() {
        let (tx, rx) = mpsc::channel(4);
        tx.send("event: a\ndata: 1\n\n".to_string()).await.unwrap();
        tx.send("event: b\ndata: 2\n\n".to_string()).await.unwrap();
        drop(tx);

        let resp = sse_response(StreamFormat::SseNamedEvent, rx);
        let collected = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(collected.to_vec()).unwrap();
        assert_eq!(text, "event: a\ndata: 1\n\nevent: b\ndata: 2\n\n");
    }
}
