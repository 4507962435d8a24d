use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::Response,
    Json,
};

use stockflow_auth::Method;
use stockflow_infra::requests::{
    CreateShipmentRequest, ListShipmentsRequest, UpdateShipmentRequest,
};

use super::{body, call, query};
use crate::app::dto;
use crate::app::services::AppServices;
use crate::middleware::CallHeaders;

pub async fn create_shipment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(headers): Extension<CallHeaders>,
    req: Result<Json<CreateShipmentRequest>, JsonRejection>,
) -> Response {
    let dispatcher = &services.dispatcher;
    let ctx = &headers.context;
    call(&services, &headers, Method::CreateShipment, body(req), StatusCode::CREATED, |req| {
        dispatcher.create_shipment(ctx, req)
    })
    .await
}

pub async fn update_shipment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(headers): Extension<CallHeaders>,
    Path(id): Path<String>,
    req: Result<Json<UpdateShipmentRequest>, JsonRejection>,
) -> Response {
    let dispatcher = &services.dispatcher;
    let ctx = &headers.context;
    let req = body(req).map(|req| UpdateShipmentRequest { id, ..req });
    call(&services, &headers, Method::UpdateShipment, req, StatusCode::OK, |req| {
        dispatcher.update_shipment(ctx, req)
    })
    .await
}

pub async fn list_shipments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(headers): Extension<CallHeaders>,
    q: Result<Query<dto::ListShipmentsQuery>, QueryRejection>,
) -> Response {
    let dispatcher = &services.dispatcher;
    let ctx = &headers.context;
    let req: Result<ListShipmentsRequest, String> = query(q).map(Into::into);
    call(&services, &headers, Method::ListShipments, req, StatusCode::OK, |req| {
        dispatcher.list_shipments(ctx, req)
    })
    .await
}
