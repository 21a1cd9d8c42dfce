//! Tee'd transport: observe response bodies while they stream.
//!
//! [`TeeTransport`] wraps another [`Transport`]. Every successful response
//! gets its body replaced by a [`TeeBody`], which hands the caller exactly the
//! bytes the wrapped body produced and, after each successful read, feeds the
//! byte count into a [`StreamTap`] drawing a live sparkline on a diagnostic
//! writer (stderr by default).
//!
//! ## Example
//!
//! ```rust,no_run
//! use promscatter_client::{HttpTransport, PrometheusClient, TeeTransport};
//!
//! let transport = TeeTransport::new(HttpTransport::new());
//! let client = PrometheusClient::new("http://localhost:9090", transport).unwrap();
//! ```

use std::fmt;
use std::io::{self, Write};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Request;
use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::sync::CancellationToken;

use crate::spark::{StreamTap, DEFAULT_INTERVAL, DEFAULT_WIDTH};
use crate::transport::{Body, BodyStream, Response, Transport};
use crate::TransportError;

/// Diagnostic writer receiving the sparkline of one response.
pub type Sink = Box<dyn Write + Send>;

type SinkFactory = Arc<dyn Fn() -> Sink + Send + Sync>;

/// A [`Transport`] that draws a sparkline of every response body it returns.
#[derive(Clone)]
pub struct TeeTransport<T> {
    inner: T,
    sink: SinkFactory,
    width: usize,
    interval: Duration,
}

impl<T: Transport> TeeTransport<T> {
    /// Wrap `inner`, drawing on stderr.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            sink: Arc::new(|| Box::new(io::stderr()) as Sink),
            width: DEFAULT_WIDTH,
            interval: DEFAULT_INTERVAL,
        }
    }

    /// Use `factory` to open a diagnostic writer per response.
    pub fn with_sink<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Sink + Send + Sync + 'static,
    {
        self.sink = Arc::new(factory);
        self
    }

    /// Set the sparkline window (number of buckets and bucket length).
    pub fn with_window(mut self, width: usize, interval: Duration) -> Self {
        self.width = width;
        self.interval = interval;
        self
    }

    /// The wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: fmt::Debug> fmt::Debug for TeeTransport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeeTransport")
            .field("inner", &self.inner)
            .field("width", &self.width)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T: Transport> Transport for TeeTransport<T> {
    async fn round_trip(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<Response, TransportError> {
        let Response {
            status,
            headers,
            body,
        } = self.inner.round_trip(request, cancel).await?;

        let tap = StreamTap::with_window((self.sink)(), self.width, self.interval);
        Ok(Response {
            status,
            headers,
            body: Body::new(TeeBody::new(body, tap)),
        })
    }
}

/// Body that forwards reads unchanged and reports them to a [`StreamTap`].
///
/// Owns the wrapped body and is the only party that closes it.
pub struct TeeBody {
    inner: Body,
    tap: Option<StreamTap<Sink>>,
}

impl TeeBody {
    /// Tee `inner` into `tap`.
    pub fn new(inner: Body, tap: StreamTap<Sink>) -> Self {
        Self {
            inner,
            tap: Some(tap),
        }
    }

    fn finish_tap(&mut self) {
        if let Some(tap) = self.tap.take() {
            let _ = tap.finish();
        }
    }
}

impl fmt::Debug for TeeBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeeBody")
            .field("inner", &self.inner)
            .field("observed", &self.tap.as_ref().map(StreamTap::total))
            .finish()
    }
}

impl AsyncRead for TeeBody {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let had_room = buf.remaining() > 0;
        let before = buf.filled().len();

        ready!(Pin::new(&mut this.inner).poll_read(cx, buf))?;

        let read = buf.filled().len() - before;
        if read > 0 {
            if let Some(tap) = this.tap.as_mut() {
                tap.observe(read);
            }
        } else if had_room {
            // EOF
            this.finish_tap();
        }
        Poll::Ready(Ok(()))
    }
}

impl BodyStream for TeeBody {
    fn close(&mut self) -> io::Result<()> {
        let result = self.inner.close();
        self.finish_tap();
        result
    }
}
