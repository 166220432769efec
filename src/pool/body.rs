//! Response body wrapper that returns the connection to the pool.
//!
//! A pooled connection is only reusable once the origin's response body
//! has been fully consumed. This wrapper streams the body through and
//! releases the connection on the final frame; dropping mid-stream lets
//! the PooledConnection drop, which discards the connection.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use hyper::body::{Frame, SizeHint};

use crate::pool::pool::PooledConnection;

pub struct GuardedBody {
    inner: Body,
    pooled: Option<PooledConnection>,
}

impl GuardedBody {
    pub fn new(inner: Body, pooled: PooledConnection) -> Self {
        Self {
            inner,
            pooled: Some(pooled),
        }
    }
}

impl hyper::body::Body for GuardedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(None) => {
                if let Some(pooled) = this.pooled.take() {
                    let reusable = pooled.is_open();
                    pooled.release(reusable);
                }
                Poll::Ready(None)
            }
            Poll::Ready(Some(Err(e))) => {
                // Body error: the connection state is unknown, discard it.
                this.pooled.take();
                Poll::Ready(Some(Err(e)))
            }
            other => other,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
