//! Request timing middleware.

use std::time::Instant;

use async_trait::async_trait;
use http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result};
use tracing::{debug, warn};

/// Logs method, path, status and elapsed time of every outbound request.
///
/// Query strings are left out of the log line since they may carry
/// user data (e.g. filter formulas containing names).
pub struct RequestTimer {
    label: &'static str,
}

impl RequestTimer {
    pub fn new(label: &'static str) -> Self {
        Self { label }
    }
}

#[async_trait]
impl Middleware for RequestTimer {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let method = req.method().clone();
        let path = req.url().path().to_string();
        let started = Instant::now();

        let result = next.run(req, extensions).await;
        let elapsed_ms = started.elapsed().as_millis();

        match &result {
            Ok(response) => debug!(
                "[{}] {} {} -> {} in {}ms",
                self.label,
                method,
                path,
                response.status(),
                elapsed_ms
            ),
            Err(err) => warn!(
                "[{}] {} {} failed after {}ms: {}",
                self.label, method, path, elapsed_ms, err
            ),
        }

        result
    }
}
