//! HTTP transport abstraction.
//!
//! A [`Transport`] performs a single request/response exchange and hands back
//! the response with its body still streaming. Wrappers such as
//! [`TeeTransport`](crate::TeeTransport) decorate any transport by delegating
//! to it and replacing the body.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::header::HeaderMap;
use reqwest::{Client, Request, StatusCode};
use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::TransportError;

/// Performs HTTP round trips.
///
/// Cancelling `cancel` must abort an in-flight exchange; implementations that
/// wrap another transport pass the token through untouched.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return the response with an unread body.
    async fn round_trip(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<Response, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn round_trip(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<Response, TransportError> {
        (**self).round_trip(request, cancel).await
    }
}

/// A response whose body has not been read yet.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

/// A readable, closable byte stream.
///
/// `close` releases the underlying resource. [`Body`] guarantees it is called
/// at most once.
pub trait BodyStream: AsyncRead + Send + Unpin {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Adapts a plain reader into a [`BodyStream`] whose close just drops it.
struct ReaderBody<R>(R);

impl<R: AsyncRead + Send + Unpin> AsyncRead for ReaderBody<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.0).poll_read(cx, buf)
    }
}

impl<R: AsyncRead + Send + Unpin> BodyStream for ReaderBody<R> {}

/// Owned response body.
///
/// Reading after [`close`](Body::close) fails; closing twice is a no-op.
/// Dropping an open body closes it.
pub struct Body {
    inner: Option<Box<dyn BodyStream>>,
}

impl Body {
    /// Wrap a body stream.
    pub fn new<B: BodyStream + 'static>(stream: B) -> Self {
        Self {
            inner: Some(Box::new(stream)),
        }
    }

    /// Wrap any async reader.
    pub fn from_reader<R: AsyncRead + Send + Unpin + 'static>(reader: R) -> Self {
        Self::new(ReaderBody(reader))
    }

    /// A body with no content.
    pub fn empty() -> Self {
        Self::from_reader(tokio::io::empty())
    }

    /// Close the underlying stream. Subsequent calls return `Ok(())`.
    pub fn close(&mut self) -> io::Result<()> {
        match self.inner.take() {
            Some(mut stream) => stream.close(),
            None => Ok(()),
        }
    }

    /// Check if the body has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl AsyncRead for Body {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.inner.as_mut() {
            Some(stream) => Pin::new(stream).poll_read(cx, buf),
            None => Poll::Ready(Err(io::Error::other("read on closed response body"))),
        }
    }
}

impl BodyStream for Body {
    fn close(&mut self) -> io::Result<()> {
        Body::close(self)
    }
}

impl Drop for Body {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport around an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn round_trip(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<Response, TransportError> {
        debug!(method = %request.method(), url = %request.url(), "sending request");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            response = self.client.execute(request) => response?,
        };

        let status = response.status();
        let headers = response.headers().clone();
        let stream = Box::pin(response.bytes_stream().map_err(io::Error::other));

        Ok(Response {
            status,
            headers,
            body: Body::from_reader(StreamReader::new(stream)),
        })
    }
}
