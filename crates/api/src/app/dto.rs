//! Query-string shapes. Bodies deserialize straight into the infra requests.
//!
//! Pagination fields default to `0` so a missing `page` reaches the service
//! layer and is rejected there as InvalidArgument, like any other bad value.

use serde::Deserialize;

use stockflow_infra::requests::{AuditLogsRequest, ListItemsRequest, ListShipmentsRequest};

#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    #[serde(default)]
    pub name_filter: String,
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub page_size: i64,
}

impl From<ListItemsQuery> for ListItemsRequest {
    fn from(q: ListItemsQuery) -> Self {
        Self {
            name_filter: q.name_filter,
            page: q.page,
            page_size: q.page_size,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListShipmentsQuery {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub page_size: i64,
}

impl From<ListShipmentsQuery> for ListShipmentsRequest {
    fn from(q: ListShipmentsQuery) -> Self {
        Self {
            order_id: q.order_id,
            page: q.page,
            page_size: q.page_size,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AuditLogsQuery {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub page_size: i64,
}

impl From<AuditLogsQuery> for AuditLogsRequest {
    fn from(q: AuditLogsQuery) -> Self {
        Self {
            api_key: q.api_key,
            page: q.page,
            page_size: q.page_size,
        }
    }
}
