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
    CreateItemRequest, DeleteItemRequest, ListItemsRequest, UpdateItemRequest,
};

use super::{body, call, query};
use crate::app::dto;
use crate::app::services::AppServices;
use crate::middleware::CallHeaders;

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(headers): Extension<CallHeaders>,
    req: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Response {
    let dispatcher = &services.dispatcher;
    let ctx = &headers.context;
    call(&services, &headers, Method::CreateItem, body(req), StatusCode::CREATED, |req| {
        dispatcher.create_item(ctx, req)
    })
    .await
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(headers): Extension<CallHeaders>,
    Path(id): Path<String>,
    req: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Response {
    let dispatcher = &services.dispatcher;
    let ctx = &headers.context;
    let req = body(req).map(|req| UpdateItemRequest { id, ..req });
    call(&services, &headers, Method::UpdateItem, req, StatusCode::OK, |req| {
        dispatcher.update_item(ctx, req)
    })
    .await
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(headers): Extension<CallHeaders>,
    Path(id): Path<String>,
) -> Response {
    let dispatcher = &services.dispatcher;
    let ctx = &headers.context;
    let req = Ok(DeleteItemRequest { id });
    call(&services, &headers, Method::DeleteItem, req, StatusCode::OK, |req| {
        dispatcher.delete_item(ctx, req)
    })
    .await
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(headers): Extension<CallHeaders>,
    q: Result<Query<dto::ListItemsQuery>, QueryRejection>,
) -> Response {
    let dispatcher = &services.dispatcher;
    let ctx = &headers.context;
    let req: Result<ListItemsRequest, String> = query(q).map(Into::into);
    call(&services, &headers, Method::ListItems, req, StatusCode::OK, |req| {
        dispatcher.list_items(ctx, req)
    })
    .await
}
