use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::Response,
    Json,
};

use stockflow_auth::Method;
use stockflow_infra::requests::{CreateOrderRequest, FulfillOrderRequest, GetOrderRequest};

use super::{body, call};
use crate::app::services::AppServices;
use crate::middleware::CallHeaders;

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(headers): Extension<CallHeaders>,
    req: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Response {
    let dispatcher = &services.dispatcher;
    let ctx = &headers.context;
    call(&services, &headers, Method::CreateOrder, body(req), StatusCode::CREATED, |req| {
        dispatcher.create_order(ctx, req)
    })
    .await
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(headers): Extension<CallHeaders>,
    Path(id): Path<String>,
) -> Response {
    let dispatcher = &services.dispatcher;
    let ctx = &headers.context;
    let req = Ok(GetOrderRequest { id });
    call(&services, &headers, Method::GetOrder, req, StatusCode::OK, |req| {
        dispatcher.get_order(ctx, req)
    })
    .await
}

pub async fn fulfill_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(headers): Extension<CallHeaders>,
    Path(order_id): Path<String>,
) -> Response {
    let dispatcher = &services.dispatcher;
    let ctx = &headers.context;
    let req = Ok(FulfillOrderRequest { order_id });
    call(&services, &headers, Method::FulfillOrder, req, StatusCode::OK, |req| {
        dispatcher.fulfill_order(ctx, req)
    })
    .await
}
