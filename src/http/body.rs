//! Outbound request body wrapper.
//!
//! The response-header deadline counts from the moment the request is fully
//! written. The client only reports the response, so the body itself says
//! when it has been drained.

use axum::body::{Body, Bytes};
use hyper::body::{Body as HttpBody, Frame, SizeHint};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Body that fires a oneshot once its last frame has been taken.
///
/// The receiver also resolves (with an error) if the body is dropped early.
pub struct NotifyOnEnd {
    inner: Body,
    done: Option<oneshot::Sender<()>>,
}

impl NotifyOnEnd {
    pub fn wrap(inner: Body) -> (Body, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let body = Self {
            inner,
            done: Some(tx),
        };
        (Body::new(body), rx)
    }

    fn finish(&mut self) {
        if let Some(tx) = self.done.take() {
            let _ = tx.send(());
        }
    }
}

impl HttpBody for NotifyOnEnd {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(None) => this.finish(),
            Poll::Ready(Some(Ok(_))) if this.inner.is_end_stream() => this.finish(),
            _ => {}
        }
        polled
    }

    // Never claim end-of-stream before the writer has polled once, otherwise
    // an empty body would be skipped and the signal never sent.
    fn is_end_stream(&self) -> bool {
        self.done.is_none() && self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
