use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    http::StatusCode,
    response::Response,
};

use stockflow_auth::Method;
use stockflow_infra::requests::AuditLogsRequest;

use super::{call, query};
use crate::app::dto;
use crate::app::services::AppServices;
use crate::middleware::CallHeaders;

pub async fn audit_logs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(headers): Extension<CallHeaders>,
    q: Result<Query<dto::AuditLogsQuery>, QueryRejection>,
) -> Response {
    let dispatcher = &services.dispatcher;
    let ctx = &headers.context;
    let req: Result<AuditLogsRequest, String> = query(q).map(Into::into);
    call(&services, &headers, Method::AuditLogs, req, StatusCode::OK, |req| {
        dispatcher.audit_logs(ctx, req)
    })
    .await
}
