use std::time::Duration;

use axum::{http::HeaderMap, middleware::Next, response::Response};

use stockflow_infra::CallContext;

/// Credential header. Its value is resolved by the authorization gate.
pub const API_KEY_HEADER: &str = "api-key";
/// Optional per-request deadline in milliseconds.
pub const REQUEST_TIMEOUT_HEADER: &str = "x-request-timeout-ms";

/// Call inputs read from the transport headers.
///
/// A malformed header is carried in `invalid` rather than rejected here, so the
/// handler can still run the gate before answering InvalidArgument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallHeaders {
    pub context: CallContext,
    pub invalid: Option<String>,
}

/// Turn the transport headers into a `CallHeaders` extension.
pub async fn call_context_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let headers = call_headers(req.headers());
    req.extensions_mut().insert(headers);
    next.run(req).await
}

fn call_headers(headers: &HeaderMap) -> CallHeaders {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|v| !v.is_empty());

    let mut invalid = None;
    let timeout = headers.get(REQUEST_TIMEOUT_HEADER).and_then(|raw| {
        let ms = raw
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0);
        if ms.is_none() {
            invalid = Some(format!("{REQUEST_TIMEOUT_HEADER} must be a positive integer"));
        }
        ms.map(Duration::from_millis)
    });

    CallHeaders {
        context: CallContext { api_key, timeout },
        invalid,
    }
}
