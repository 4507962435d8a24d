use std::future::Future;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query,
    },
    http::StatusCode,
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;

use stockflow_auth::Method;
use stockflow_core::ServiceResult;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::middleware::CallHeaders;

pub mod audit;
pub mod items;
pub mod orders;
pub mod shipments;
pub mod system;

/// Router for every gated operation. The gate itself runs in the dispatcher.
pub fn router() -> Router {
    Router::new()
        .route("/items", post(items::create_item).get(items::list_items))
        .route("/items/:id", put(items::update_item).delete(items::delete_item))
        .route("/orders", post(orders::create_order))
        .route("/orders/:id", get(orders::get_order))
        .route("/orders/:id/fulfill", post(orders::fulfill_order))
        .route("/shipments", post(shipments::create_shipment).get(shipments::list_shipments))
        .route("/shipments/:id", put(shipments::update_shipment))
        .route("/audit-logs", get(audit::audit_logs))
}

/// Run one operation, or reject its undecodable input through the gate.
///
/// A bad header or body never short-circuits authentication: the dispatcher
/// decides between Unauthenticated, PermissionDenied, and an audited
/// InvalidArgument.
pub(crate) async fn call<T, R, F, Fut>(
    services: &AppServices,
    headers: &CallHeaders,
    method: Method,
    input: Result<T, String>,
    status: StatusCode,
    op: F,
) -> Response
where
    F: FnOnce(T) -> Fut,
    Fut: Future<Output = ServiceResult<R>>,
    R: Serialize,
{
    let input = match &headers.invalid {
        Some(message) => Err(message.clone()),
        None => input,
    };
    match input {
        Ok(req) => errors::respond(status, op(req).await),
        Err(message) => errors::service_error_to_response(
            services
                .dispatcher
                .reject_malformed(&headers.context, method, message)
                .await,
        ),
    }
}

pub(crate) fn body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, String> {
    body.map(|Json(body)| body).map_err(|rejection| rejection.body_text())
}

pub(crate) fn query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, String> {
    query.map(|Query(query)| query).map_err(|rejection| rejection.body_text())
}
