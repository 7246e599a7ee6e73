//! The seam between the client and whatever executes HTTP.
//!
//! # Design
//! The client never creates its own HTTP stack. Callers hand in a
//! `Transport` and keep ownership of its connection pool, TLS and proxy
//! settings. Lending works through the `&T` and `Arc<T>` implementations.
//!
//! With the `reqwest` feature, `reqwest::Client` implements `Transport`
//! directly. It reads 2xx bodies in full and stops non-2xx bodies at
//! `MAX_ERROR_BODY` bytes.

use std::future::Future;
use std::sync::Arc;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
///
/// Implementations must return every received response, including non-2xx
/// ones, as `Ok`; status interpretation belongs to the client. Dropping the
/// returned future must abort the call.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        (**self).execute(request)
    }
}

#[cfg(feature = "reqwest")]
mod reqwest_transport {
    use bytes::{Bytes, BytesMut};

    use super::*;
    use crate::client::MAX_ERROR_BODY;

    fn request_error(err: reqwest::Error) -> TransportError {
        TransportError::Request(Box::new(err))
    }

    /// Reads at most `limit` bytes of an error body and drops the rest.
    ///
    /// A read failure ends the body early; the status is what matters here.
    async fn read_error_body(mut response: reqwest::Response, limit: usize) -> Bytes {
        let mut body = BytesMut::new();
        while body.len() < limit {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let take = chunk.len().min(limit - body.len());
                    body.extend_from_slice(&chunk[..take]);
                }
                Ok(None) => break,
                Err(err) => {
                    tracing::debug!(error = %err, "error body read cut short");
                    break;
                }
            }
        }
        body.freeze()
    }

    impl Transport for reqwest::Client {
        fn execute(
            &self,
            request: HttpRequest,
        ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
            let mut builder = self.request(request.method, request.url.as_str());
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            async move {
                let response = builder.send().await.map_err(request_error)?;
                let status = response.status();
                let headers = response
                    .headers()
                    .iter()
                    .filter_map(|(name, value)| {
                        value
                            .to_str()
                            .ok()
                            .map(|v| (name.as_str().to_string(), v.to_string()))
                    })
                    .collect();
                let body = if status.is_success() {
                    response.bytes().await.map_err(request_error)?
                } else {
                    read_error_body(response, MAX_ERROR_BODY).await
                };

                Ok(HttpResponse {
                    status,
                    headers,
                    body,
                })
            }
        }
    }
}
