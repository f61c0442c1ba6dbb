//! Application entry point
//!
//! `application()` returns the process-wide application object, built once
//! over the global settings. Wrap it with middleware through
//! `Application::wrap`. Request routing is not part of this crate: the base
//! handler answers every request with `404 Not Found`.

use crate::contract::{keys, SettingsApi};
use crate::domain::settings;
use http::{header, StatusCode};
use once_cell::sync::Lazy;
use std::sync::Arc;

pub type Request = http::Request<Vec<u8>>;
pub type Response = http::Response<Vec<u8>>;

/// Anything that turns a request into a response
pub trait Handler: Send + Sync {
    fn call(&self, request: Request) -> Response;
}

impl<F> Handler for F
where
    F: Fn(Request) -> Response + Send + Sync,
{
    fn call(&self, request: Request) -> Response {
        self(request)
    }
}

/// Base handler without any routing
pub struct BaseHandler {
    settings: Arc<dyn SettingsApi>,
}

impl BaseHandler {
    pub fn new(settings: Arc<dyn SettingsApi>) -> Self {
        Self { settings }
    }

    fn content_type(&self) -> String {
        let charset = self
            .settings
            .get("DEFAULT_CHARSET")
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "utf-8".to_string());
        format!("text/html; charset={}", charset)
    }
}

impl Handler for BaseHandler {
    fn call(&self, request: Request) -> Response {
        // Settings must be loadable before anything is served
        let debug = match self.settings.get(keys::DEBUG.name()) {
            Ok(value) => value.as_bool().unwrap_or(false),
            Err(e) => {
                tracing::error!(error = %e, "settings unavailable");
                return plain(StatusCode::INTERNAL_SERVER_ERROR, b"Internal Server Error".to_vec());
            }
        };

        tracing::debug!(method = %request.method(), path = %request.uri().path(), "no route");
        let body = if debug {
            format!("No route matches {}", request.uri().path()).into_bytes()
        } else {
            b"Not Found".to_vec()
        };

        let mut response = plain(StatusCode::NOT_FOUND, body);
        if let Ok(value) = header::HeaderValue::from_str(&self.content_type()) {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
        response
    }
}

fn plain(status: StatusCode, body: Vec<u8>) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
}

/// Callable application object
#[derive(Clone)]
pub struct Application {
    handler: Arc<dyn Handler>,
}

impl Application {
    pub fn new(handler: impl Handler + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Wrap the current handler in a middleware
    pub fn wrap<M, F>(self, middleware: F) -> Self
    where
        F: FnOnce(Arc<dyn Handler>) -> M,
        M: Handler + 'static,
    {
        Self {
            handler: Arc::new(middleware(self.handler)),
        }
    }

    pub fn call(&self, request: Request) -> Response {
        self.handler.call(request)
    }
}

static APPLICATION: Lazy<Application> =
    Lazy::new(|| Application::new(BaseHandler::new(Arc::new(settings()))));

/// The process-wide application object
pub fn application() -> &'static Application {
    &APPLICATION
}
