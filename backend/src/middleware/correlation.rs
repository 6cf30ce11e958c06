//! Middleware attaching a request-scoped correlation identifier.
//!
//! Each incoming request gets a fresh [`CorrelationId`] scoped into
//! task-local storage for the duration of the handler call, and every
//! response carries it back in the `correlation-id` header. Handlers and the
//! registration service read the identifier via [`CorrelationId::current`]
//! (or [`CorrelationId::acquire`]), so all log events of one attempt join on
//! the same value without parameter threading.

use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::error;

use crate::domain::{CORRELATION_ID_HEADER, CorrelationId};

/// Middleware attaching a request-scoped correlation identifier and adding a
/// `correlation-id` header to every response.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use backend::Correlation;
///
/// let app = App::new().wrap(Correlation);
/// ```
#[derive(Clone)]
pub struct Correlation;

impl<S, B> Transform<S, ServiceRequest> for Correlation
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = CorrelationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorrelationMiddleware { service }))
    }
}

/// Service wrapper produced by [`Correlation`].
///
/// Applications should not use this type directly.
pub struct CorrelationMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for CorrelationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let correlation_id = CorrelationId::generate();
        let header_value = correlation_id.to_string();
        let fut = self.service.call(req);
        Box::pin(CorrelationId::scope(correlation_id, async move {
            let mut res = fut.await?;
            match HeaderValue::from_str(&header_value) {
                Ok(value) => {
                    res.response_mut()
                        .headers_mut()
                        .insert(HeaderName::from_static(CORRELATION_ID_HEADER), value);
                }
                Err(err) => {
                    error!(
                        error = %err,
                        correlation_id = %correlation_id,
                        "failed to encode correlation identifier header"
                    );
                }
            }
            Ok(res)
        }))
    }
}
