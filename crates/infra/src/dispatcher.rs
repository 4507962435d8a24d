//! Gated call pipeline.
//!
//! Every remote operation runs through [`Dispatcher`]:
//!
//! ```text
//! call (credential, request)
//!   ↓
//! 1. AuthorizationGate: authenticate + authorize by role
//!      rejected → return immediately, nothing audited
//!   ↓
//! 2. Workflow stages its writes, bounded by the call deadline
//!      expired → DeadlineExceeded; the open transaction is dropped (rolled back)
//!   ↓
//! 3. Commit, outside the deadline
//!   ↓
//! 4. AuditRecorder: one entry with "success" or the error code
//!   ↓
//! result
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::{Instant, timeout_at};
use tracing::Instrument;

use stockflow_auth::{AllowList, AuthorizationGate, CredentialStore, Method};
use stockflow_core::{Page, PageRequest, ServiceError, ServiceResult};
use stockflow_inventory::Item;
use stockflow_sales::Order;
use stockflow_shipping::Shipment;

use crate::audit::{AuditLogEntry, AuditRecorder, AuditSink, SUCCESS_STATUS};
use crate::requests::{
    AuditLogsRequest, CreateItemRequest, CreateOrderRequest, CreateShipmentRequest,
    DeleteItemRequest, DeleteItemResponse, FulfillOrderRequest, GetOrderRequest, ListItemsRequest,
    ListShipmentsRequest, UpdateItemRequest, UpdateShipmentRequest,
};
use crate::store::Store;
use crate::workflows::{InventoryLedger, OrderWorkflow, ShipmentTracker, Staged};

/// Per-call inputs that travel beside the request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    pub api_key: Option<String>,
    /// Overrides the dispatcher's default deadline for this call.
    pub timeout: Option<Duration>,
}

impl CallContext {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherSettings {
    /// Default deadline of one call, gate and workflow included.
    pub call_timeout: Duration,
    /// Bound on one audit write.
    pub audit_timeout: Duration,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
            audit_timeout: Duration::from_secs(2),
        }
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    gate: AuthorizationGate,
    recorder: AuditRecorder,
    inventory: InventoryLedger,
    orders: OrderWorkflow,
    shipments: ShipmentTracker,
    call_timeout: Duration,
}

impl Dispatcher {
    /// Wire every component to one backend with the standard allow-list.
    pub fn new<B>(backend: Arc<B>, settings: DispatcherSettings) -> Self
    where
        B: Store + CredentialStore + AuditSink + 'static,
    {
        let gate = AuthorizationGate::new(backend.clone(), AllowList::standard());
        let recorder = AuditRecorder::new(backend.clone(), settings.audit_timeout);
        Self::from_parts(backend, gate, recorder, settings.call_timeout)
    }

    pub fn from_parts(
        store: Arc<dyn Store>,
        gate: AuthorizationGate,
        recorder: AuditRecorder,
        call_timeout: Duration,
    ) -> Self {
        Self {
            gate,
            recorder,
            inventory: InventoryLedger::new(store.clone()),
            orders: OrderWorkflow::new(store.clone()),
            shipments: ShipmentTracker::new(store),
            call_timeout,
        }
    }

    pub async fn create_item(&self, ctx: &CallContext, req: CreateItemRequest) -> ServiceResult<Item> {
        self.dispatch(ctx, Method::CreateItem, req, |req| self.inventory.create_item(req))
            .await
    }

    pub async fn update_item(&self, ctx: &CallContext, req: UpdateItemRequest) -> ServiceResult<Item> {
        self.dispatch(ctx, Method::UpdateItem, req, |req| self.inventory.update_item(req))
            .await
    }

    pub async fn delete_item(
        &self,
        ctx: &CallContext,
        req: DeleteItemRequest,
    ) -> ServiceResult<DeleteItemResponse> {
        self.dispatch(ctx, Method::DeleteItem, req, |req| self.inventory.delete_item(req))
            .await
    }

    pub async fn list_items(
        &self,
        ctx: &CallContext,
        req: ListItemsRequest,
    ) -> ServiceResult<Page<Item>> {
        self.dispatch(ctx, Method::ListItems, req, move |req| async move {
            self.inventory.list_items(req).await.map(Staged::ready)
        })
        .await
    }

    pub async fn create_order(&self, ctx: &CallContext, req: CreateOrderRequest) -> ServiceResult<Order> {
        self.dispatch(ctx, Method::CreateOrder, req, |req| self.orders.create_order(req))
            .await
    }

    pub async fn fulfill_order(
        &self,
        ctx: &CallContext,
        req: FulfillOrderRequest,
    ) -> ServiceResult<Order> {
        self.dispatch(ctx, Method::FulfillOrder, req, |req| self.orders.fulfill_order(req))
            .await
    }

    pub async fn get_order(&self, ctx: &CallContext, req: GetOrderRequest) -> ServiceResult<Order> {
        self.dispatch(ctx, Method::GetOrder, req, move |req| async move {
            self.orders.get_order(req).await.map(Staged::ready)
        })
        .await
    }

    pub async fn create_shipment(
        &self,
        ctx: &CallContext,
        req: CreateShipmentRequest,
    ) -> ServiceResult<Shipment> {
        self.dispatch(ctx, Method::CreateShipment, req, |req| {
            self.shipments.create_shipment(req)
        })
        .await
    }

    pub async fn update_shipment(
        &self,
        ctx: &CallContext,
        req: UpdateShipmentRequest,
    ) -> ServiceResult<Shipment> {
        self.dispatch(ctx, Method::UpdateShipment, req, |req| {
            self.shipments.update_shipment(req)
        })
        .await
    }

    pub async fn list_shipments(
        &self,
        ctx: &CallContext,
        req: ListShipmentsRequest,
    ) -> ServiceResult<Page<Shipment>> {
        self.dispatch(ctx, Method::ListShipments, req, move |req| async move {
            self.shipments.list_shipments(req).await.map(Staged::ready)
        })
        .await
    }

    /// Entries recorded under `req.api_key`, newest first.
    pub async fn audit_logs(
        &self,
        ctx: &CallContext,
        req: AuditLogsRequest,
    ) -> ServiceResult<Page<AuditLogEntry>> {
        self.dispatch(ctx, Method::AuditLogs, req, move |req| async move {
            let page = PageRequest::new(req.page, req.page_size)?;
            self.recorder.entries_for(&req.api_key, page).await.map(Staged::ready)
        })
        .await
    }

    /// A call whose input could not be decoded by the transport.
    ///
    /// It still goes through the gate, so an unknown caller gets
    /// Unauthenticated and a caller without the role gets PermissionDenied.
    /// An authorized caller gets InvalidArgument, and the attempt is audited.
    pub async fn reject_malformed(
        &self,
        ctx: &CallContext,
        method: Method,
        message: impl Into<String>,
    ) -> ServiceError {
        let message = message.into();
        let payload = serde_json::json!({ "malformed_request": &message });
        let reason = message.clone();
        self.dispatch(ctx, method, payload, move |_| async move {
            Err::<Staged<()>, _>(ServiceError::invalid_argument(reason))
        })
        .await
        .err()
        .unwrap_or_else(|| ServiceError::invalid_argument(message))
    }

    async fn dispatch<Req, Resp, F, Fut>(
        &self,
        ctx: &CallContext,
        method: Method,
        req: Req,
        op: F,
    ) -> ServiceResult<Resp>
    where
        Req: Serialize,
        F: FnOnce(Req) -> Fut,
        Fut: Future<Output = ServiceResult<Staged<Resp>>>,
    {
        let span = tracing::info_span!(
            "call",
            method = method.as_str(),
            role = tracing::field::Empty
        );

        async move {
            let deadline = Instant::now() + ctx.timeout.unwrap_or(self.call_timeout);

            let principal =
                match timeout_at(deadline, self.gate.check(ctx.api_key.as_deref(), method)).await {
                    Ok(Ok(principal)) => principal,
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "call rejected");
                        return Err(e.into());
                    }
                    Err(_) => {
                        tracing::warn!("deadline expired during authorization");
                        return Err(ServiceError::DeadlineExceeded);
                    }
                };
            tracing::Span::current().record("role", principal.role.as_str());

            let payload = serde_json::to_string(&req).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to serialize request for audit");
                "{}".to_string()
            });

            // The deadline bounds the staging work only. A started commit runs
            // to completion.
            let result = match timeout_at(deadline, op(req)).await {
                Ok(Ok(staged)) => staged.commit().await,
                Ok(Err(e)) => Err(e),
                Err(_) => Err(ServiceError::DeadlineExceeded),
            };

            let status = match &result {
                Ok(_) => SUCCESS_STATUS,
                Err(e) => e.code().as_str(),
            };
            self.recorder
                .record(&principal.api_key, method, payload, status)
                .await;

            match &result {
                Ok(_) => tracing::info!("call succeeded"),
                Err(e) => tracing::warn!(code = %e.code(), error = %e, "call failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use async_trait::async_trait;
    use stockflow_auth::Role;
    use stockflow_core::{Code, Money};
    use stockflow_inventory::ItemFilter;
    use stockflow_shipping::ShipmentFilter;

    use crate::store::{StoreError, StoreTx};

    fn backend() -> Arc<InMemoryStore> {
        let store = InMemoryStore::new();
        store.provision_credential("customer-key", Role::CUSTOMER);
        store.provision_credential("admin-key", Role::ADMIN);
        Arc::new(store)
    }

    fn widget() -> CreateItemRequest {
        CreateItemRequest {
            name: "Widget".to_string(),
            description: String::new(),
            quantity: 5,
            unit_price: Money::new(999, "USD"),
        }
    }

    async fn audit_for(store: &InMemoryStore, api_key: &str) -> Page<AuditLogEntry> {
        store
            .entries_for(api_key, PageRequest::new(1, 100).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn success_is_audited_with_payload() {
        let store = backend();
        let dispatcher = Dispatcher::new(store.clone(), DispatcherSettings::default());

        dispatcher
            .create_item(&CallContext::new("admin-key"), widget())
            .await
            .unwrap();

        let audit = audit_for(&store, "admin-key").await;
        assert_eq!(audit.total, 1);
        let entry = &audit.records[0];
        assert_eq!(entry.method, "CreateItem");
        assert_eq!(entry.status, "success");
        let payload: serde_json::Value = serde_json::from_str(&entry.request_data).unwrap();
        assert_eq!(payload["name"], "Widget");
        assert_eq!(payload["unit_price"]["value"], 999);
    }

    #[tokio::test]
    async fn failure_is_audited_with_code() {
        let store = backend();
        let dispatcher = Dispatcher::new(store.clone(), DispatcherSettings::default());

        let err = dispatcher
            .delete_item(
                &CallContext::new("admin-key"),
                DeleteItemRequest { id: String::new() },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);

        let audit = audit_for(&store, "admin-key").await;
        assert_eq!(audit.records[0].status, "InvalidArgument");
    }

    #[tokio::test]
    async fn rejected_calls_are_not_audited_and_do_not_mutate() {
        let store = backend();
        let dispatcher = Dispatcher::new(store.clone(), DispatcherSettings::default());

        let err = dispatcher
            .create_item(&CallContext::new("customer-key"), widget())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::PermissionDenied);

        let err = dispatcher
            .create_item(&CallContext::default(), widget())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::Unauthenticated);

        let err = dispatcher
            .create_item(&CallContext::new("unknown-key"), widget())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::Unauthenticated);

        assert_eq!(audit_for(&store, "customer-key").await.total, 0);
        assert_eq!(audit_for(&store, "unknown-key").await.total, 0);
        let items = store
            .list_items(&ItemFilter::default(), PageRequest::new(1, 10).unwrap())
            .await
            .unwrap();
        assert_eq!(items.total, 0);
    }

    #[tokio::test]
    async fn malformed_input_is_gated_then_audited() {
        let store = backend();
        let dispatcher = Dispatcher::new(store.clone(), DispatcherSettings::default());

        let err = dispatcher
            .reject_malformed(&CallContext::default(), Method::CreateItem, "bad json")
            .await;
        assert_eq!(err.code(), Code::Unauthenticated);

        let err = dispatcher
            .reject_malformed(&CallContext::new("customer-key"), Method::CreateItem, "bad json")
            .await;
        assert_eq!(err.code(), Code::PermissionDenied);
        assert_eq!(audit_for(&store, "customer-key").await.total, 0);

        let err = dispatcher
            .reject_malformed(&CallContext::new("admin-key"), Method::CreateItem, "bad json")
            .await;
        assert_eq!(err.code(), Code::InvalidArgument);
        assert_eq!(err.message(), "bad json");

        let audit = audit_for(&store, "admin-key").await;
        assert_eq!(audit.total, 1);
        assert_eq!(audit.records[0].method, "CreateItem");
        assert_eq!(audit.records[0].status, "InvalidArgument");
        let payload: serde_json::Value = serde_json::from_str(&audit.records[0].request_data).unwrap();
        assert_eq!(payload["malformed_request"], "bad json");
    }

    #[tokio::test]
    async fn audit_logs_are_scoped_to_the_requested_key() {
        let store = backend();
        let dispatcher = Dispatcher::new(store.clone(), DispatcherSettings::default());
        let admin = CallContext::new("admin-key");
        let customer = CallContext::new("customer-key");

        dispatcher.create_item(&admin, widget()).await.unwrap();
        dispatcher
            .list_items(
                &customer,
                ListItemsRequest {
                    name_filter: String::new(),
                    page: 1,
                    page_size: 10,
                },
            )
            .await
            .unwrap();

        let logs = dispatcher
            .audit_logs(
                &admin,
                AuditLogsRequest {
                    api_key: "customer-key".to_string(),
                    page: 1,
                    page_size: 10,
                },
            )
            .await
            .unwrap();
        assert_eq!(logs.total, 1);
        assert_eq!(logs.records[0].method, "ListItems");

        let err = dispatcher
            .audit_logs(
                &admin,
                AuditLogsRequest {
                    api_key: "customer-key".to_string(),
                    page: 0,
                    page_size: 10,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
    }

    /// Store whose transactions never finish opening.
    struct StalledStore;

    #[async_trait]
    impl Store for StalledStore {
        async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
            std::future::pending().await
        }

        async fn item(&self, _id: stockflow_core::ItemId) -> Result<Option<Item>, StoreError> {
            std::future::pending().await
        }

        async fn list_items(
            &self,
            _filter: &ItemFilter,
            _page: PageRequest,
        ) -> Result<Page<Item>, StoreError> {
            std::future::pending().await
        }

        async fn order(&self, _id: stockflow_core::OrderId) -> Result<Option<Order>, StoreError> {
            std::future::pending().await
        }

        async fn list_shipments(
            &self,
            _filter: &ShipmentFilter,
            _page: PageRequest,
        ) -> Result<Page<Shipment>, StoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn expired_deadline_is_reported_and_audited() {
        let backend = backend();
        let dispatcher = Dispatcher::from_parts(
            Arc::new(StalledStore),
            AuthorizationGate::new(backend.clone(), AllowList::standard()),
            AuditRecorder::new(backend.clone(), Duration::from_secs(1)),
            Duration::from_secs(10),
        );

        let ctx = CallContext::new("admin-key").with_timeout(Duration::from_millis(50));
        let err = dispatcher.create_item(&ctx, widget()).await.unwrap_err();
        assert_eq!(err.code(), Code::DeadlineExceeded);

        let audit = audit_for(&backend, "admin-key").await;
        assert_eq!(audit.records[0].status, "DeadlineExceeded");
    }

    /// In-memory store whose commits take longer than a short call deadline.
    struct SlowCommitStore(Arc<InMemoryStore>);

    struct SlowCommitTx(Box<dyn StoreTx>);

    const COMMIT_DELAY: Duration = Duration::from_millis(150);

    #[async_trait]
    impl Store for SlowCommitStore {
        async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
            Ok(Box::new(SlowCommitTx(self.0.begin().await?)))
        }

        async fn item(&self, id: stockflow_core::ItemId) -> Result<Option<Item>, StoreError> {
            self.0.item(id).await
        }

        async fn list_items(
            &self,
            filter: &ItemFilter,
            page: PageRequest,
        ) -> Result<Page<Item>, StoreError> {
            self.0.list_items(filter, page).await
        }

        async fn order(&self, id: stockflow_core::OrderId) -> Result<Option<Order>, StoreError> {
            self.0.order(id).await
        }

        async fn list_shipments(
            &self,
            filter: &ShipmentFilter,
            page: PageRequest,
        ) -> Result<Page<Shipment>, StoreError> {
            self.0.list_shipments(filter, page).await
        }
    }

    #[async_trait]
    impl StoreTx for SlowCommitTx {
        async fn insert_item(&mut self, item: &Item) -> Result<(), StoreError> {
            self.0.insert_item(item).await
        }

        async fn update_item(&mut self, item: &Item) -> Result<bool, StoreError> {
            self.0.update_item(item).await
        }

        async fn delete_item(&mut self, id: stockflow_core::ItemId) -> Result<bool, StoreError> {
            self.0.delete_item(id).await
        }

        async fn item_price(
            &mut self,
            id: stockflow_core::ItemId,
        ) -> Result<Option<Money>, StoreError> {
            self.0.item_price(id).await
        }

        async fn decrement_stock(
            &mut self,
            id: stockflow_core::ItemId,
            quantity: i64,
        ) -> Result<bool, StoreError> {
            self.0.decrement_stock(id, quantity).await
        }

        async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
            self.0.insert_order(order).await
        }

        async fn order(&mut self, id: stockflow_core::OrderId) -> Result<Option<Order>, StoreError> {
            self.0.order(id).await
        }

        async fn transition_order(
            &mut self,
            id: stockflow_core::OrderId,
            from: stockflow_sales::OrderStatus,
            to: stockflow_sales::OrderStatus,
        ) -> Result<bool, StoreError> {
            self.0.transition_order(id, from, to).await
        }

        async fn insert_shipment(&mut self, shipment: &Shipment) -> Result<(), StoreError> {
            self.0.insert_shipment(shipment).await
        }

        async fn update_shipment(
            &mut self,
            update: &stockflow_shipping::ShipmentUpdate,
        ) -> Result<Option<Shipment>, StoreError> {
            self.0.update_shipment(update).await
        }

        async fn commit(self: Box<Self>) -> Result<(), StoreError> {
            tokio::time::sleep(COMMIT_DELAY).await;
            self.0.commit().await
        }
    }

    #[tokio::test]
    async fn started_commit_outlives_the_deadline() {
        let backend = backend();
        let dispatcher = Dispatcher::from_parts(
            Arc::new(SlowCommitStore(backend.clone())),
            AuthorizationGate::new(backend.clone(), AllowList::standard()),
            AuditRecorder::new(backend.clone(), Duration::from_secs(1)),
            Duration::from_secs(10),
        );

        let ctx = CallContext::new("admin-key").with_timeout(Duration::from_millis(50));
        let item = dispatcher.create_item(&ctx, widget()).await.unwrap();

        // The caller sees success and the row is durable.
        let stored = backend.item(item.id).await.unwrap();
        assert_eq!(stored.map(|i| i.name), Some("Widget".to_string()));
        let audit = audit_for(&backend, "admin-key").await;
        assert_eq!(audit.records[0].status, "success");
    }
}
