//! Integration tests for the full gated pipeline.
//!
//! Tests: call → AuthorizationGate → workflow → Store → AuditRecorder
//!
//! Every scenario runs against each backend:
//! - `InMemoryStore`
//! - `SqliteStore` on a private `sqlite::memory:` database
//! - `SqliteStore` on a WAL-mode file database with a multi-connection pool
//!
//! Verifies:
//! - Stock never goes negative and short fulfillments leave no partial decrement
//! - Order totals are snapshots
//! - The order/shipment state machine
//! - Racing fulfillments resolve to exactly one winner
//! - Role gating and the audit trail

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use stockflow_auth::Role;
    use stockflow_core::{Code, ItemId, Money, PageRequest};
    use stockflow_inventory::ItemFilter;
    use stockflow_sales::{Order, OrderStatus};

    use crate::audit::AuditSink;
    use crate::dispatcher::{CallContext, Dispatcher, DispatcherSettings};
    use crate::requests::*;
    use crate::store::{InMemoryStore, SqliteOptions, SqliteStore, Store};

    const CUSTOMER: &str = "customer-key-123";
    const ADMIN: &str = "admin-key-456";

    struct Harness {
        dispatcher: Dispatcher,
        store: Arc<dyn Store>,
        audit: Arc<dyn AuditSink>,
    }

    impl Harness {
        fn admin(&self) -> CallContext {
            CallContext::new(ADMIN)
        }

        fn customer(&self) -> CallContext {
            CallContext::new(CUSTOMER)
        }

        async fn item(&self, name: &str, quantity: i64, price: i64) -> ItemId {
            self.dispatcher
                .create_item(
                    &self.admin(),
                    CreateItemRequest {
                        name: name.to_string(),
                        description: String::new(),
                        quantity,
                        unit_price: Money::new(price, "USD"),
                    },
                )
                .await
                .unwrap()
                .id
        }

        async fn item_names(&self, name_filter: &str) -> Vec<String> {
            self.dispatcher
                .list_items(
                    &self.customer(),
                    ListItemsRequest {
                        name_filter: name_filter.to_string(),
                        page: 1,
                        page_size: 10,
                    },
                )
                .await
                .unwrap()
                .records
                .into_iter()
                .map(|i| i.name)
                .collect()
        }

        async fn order(&self, lines: &[(ItemId, i64)]) -> Order {
            self.dispatcher
                .create_order(
                    &self.customer(),
                    CreateOrderRequest {
                        customer_id: "C1".to_string(),
                        lines: lines
                            .iter()
                            .map(|(id, quantity)| OrderLineRequest {
                                item_id: id.to_string(),
                                quantity: *quantity,
                            })
                            .collect(),
                    },
                )
                .await
                .unwrap()
        }

        async fn fulfill(&self, order: &Order) -> stockflow_core::ServiceResult<Order> {
            self.dispatcher
                .fulfill_order(
                    &self.admin(),
                    FulfillOrderRequest {
                        order_id: order.id.to_string(),
                    },
                )
                .await
        }

        async fn stock(&self, id: ItemId) -> i64 {
            self.store.item(id).await.unwrap().unwrap().quantity
        }
    }

    fn wire<B>(backend: Arc<B>) -> Harness
    where
        B: Store + stockflow_auth::CredentialStore + AuditSink + 'static,
    {
        Harness {
            dispatcher: Dispatcher::new(backend.clone(), DispatcherSettings::default()),
            store: backend.clone(),
            audit: backend,
        }
    }

    async fn in_memory() -> Harness {
        let store = InMemoryStore::new();
        store.provision_credential(CUSTOMER, Role::CUSTOMER);
        store.provision_credential(ADMIN, Role::ADMIN);
        wire(Arc::new(store))
    }

    async fn provision(store: &SqliteStore) {
        store.provision_credential(CUSTOMER, &Role::CUSTOMER).await.unwrap();
        store.provision_credential(ADMIN, &Role::ADMIN).await.unwrap();
    }

    async fn sqlite_memory() -> Harness {
        let store = SqliteStore::in_memory().await.unwrap();
        provision(&store).await;
        wire(Arc::new(store))
    }

    async fn sqlite_file() -> Harness {
        let dir = std::env::temp_dir().join(format!("stockflow-it-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let store = SqliteStore::connect(&SqliteOptions {
            url: format!("sqlite://{}", dir.join("stockflow.db").display()),
            max_connections: 4,
            busy_timeout: Duration::from_secs(5),
        })
        .await
        .unwrap();
        provision(&store).await;
        wire(Arc::new(store))
    }

    /// Generate one test per backend for an `async fn(Harness)` scenario.
    macro_rules! on_every_backend {
        ($($scenario:ident),* $(,)?) => {
            mod in_memory_backend {
                $(
                    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
                    async fn $scenario() {
                        super::$scenario(super::in_memory().await).await;
                    }
                )*
            }

            mod sqlite_memory_backend {
                $(
                    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
                    async fn $scenario() {
                        super::$scenario(super::sqlite_memory().await).await;
                    }
                )*
            }

            mod sqlite_file_backend {
                $(
                    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
                    async fn $scenario() {
                        super::$scenario(super::sqlite_file().await).await;
                    }
                )*
            }
        };
    }

    on_every_backend!(
        create_fulfill_and_refulfill,
        short_stock_leaves_no_partial_decrement,
        total_is_a_price_snapshot,
        shipments_require_fulfilled_orders,
        racing_fulfillments_have_one_winner,
        shared_stock_never_goes_negative,
        customer_cannot_mutate_inventory,
        deleted_item_blocks_fulfillment,
        listings_page_and_count,
        name_filter_ignores_case,
        audit_trail_records_outcomes,
    );

    async fn create_fulfill_and_refulfill(h: Harness) {
        let widget = h.item("Widget", 5, 999).await;
        let item = h.store.item(widget).await.unwrap().unwrap();
        assert_eq!(item.unit_price.display_value(), "9.99");

        let order = h.order(&[(widget, 2)]).await;
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total.display_value(), "19.98");

        let fulfilled = h.fulfill(&order).await.unwrap();
        assert_eq!(fulfilled.status, OrderStatus::Fulfilled);
        assert_eq!(h.stock(widget).await, 3);

        let err = h.fulfill(&order).await.unwrap_err();
        assert_eq!(err.code(), Code::FailedPrecondition);
        assert_eq!(h.stock(widget).await, 3);
    }

    async fn short_stock_leaves_no_partial_decrement(h: Harness) {
        let plenty = h.item("Bolt", 100, 5).await;
        let scarce = h.item("Widget", 5, 999).await;
        let order = h.order(&[(plenty, 30), (scarce, 10)]).await;

        let err = h.fulfill(&order).await.unwrap_err();
        assert_eq!(err.code(), Code::FailedPrecondition);
        assert_eq!(h.stock(plenty).await, 100);
        assert_eq!(h.stock(scarce).await, 5);

        let reread = h
            .dispatcher
            .get_order(
                &h.customer(),
                GetOrderRequest {
                    id: order.id.to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(reread.status, OrderStatus::Pending);
    }

    async fn total_is_a_price_snapshot(h: Harness) {
        let widget = h.item("Widget", 5, 999).await;
        let order = h.order(&[(widget, 2)]).await;

        h.dispatcher
            .update_item(
                &h.admin(),
                UpdateItemRequest {
                    id: widget.to_string(),
                    name: "Widget".to_string(),
                    description: "repriced".to_string(),
                    quantity: 5,
                    unit_price: Money::new(5000, "USD"),
                },
            )
            .await
            .unwrap();

        let reread = h
            .dispatcher
            .get_order(
                &h.admin(),
                GetOrderRequest {
                    id: order.id.to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(reread.total, Money::new(1998, "USD"));
        assert_eq!(reread.lines, order.lines);
    }

    async fn shipments_require_fulfilled_orders(h: Harness) {
        let widget = h.item("Widget", 5, 999).await;
        let order = h.order(&[(widget, 1)]).await;
        let create = CreateShipmentRequest {
            order_id: order.id.to_string(),
            tracking_number: "TRK123456".to_string(),
        };

        let err = h
            .dispatcher
            .create_shipment(&h.admin(), create.clone())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::FailedPrecondition);

        h.fulfill(&order).await.unwrap();
        let shipment = h
            .dispatcher
            .create_shipment(&h.admin(), create)
            .await
            .unwrap();
        assert_eq!(shipment.status, "PENDING");
        assert_eq!(shipment.order_id, order.id);

        let updated = h
            .dispatcher
            .update_shipment(
                &h.admin(),
                UpdateShipmentRequest {
                    id: shipment.id.to_string(),
                    status: "IN_TRANSIT".to_string(),
                    tracking_number: "TRK999".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, "IN_TRANSIT");
        assert_eq!(updated.tracking_number, "TRK999");
        assert_eq!(updated.order_id, order.id);

        let listed = h
            .dispatcher
            .list_shipments(
                &h.admin(),
                ListShipmentsRequest {
                    order_id: order.id.to_string(),
                    page: 1,
                    page_size: 10,
                },
            )
            .await
            .unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.records[0], updated);
    }

    async fn racing_fulfillments_have_one_winner(h: Harness) {
        let widget = h.item("Widget", 5, 999).await;
        let order = h.order(&[(widget, 2)]).await;

        let mut handles = Vec::new();
        for _ in 0..2 {
            let dispatcher = h.dispatcher.clone();
            let req = FulfillOrderRequest {
                order_id: order.id.to_string(),
            };
            handles.push(tokio::spawn(async move {
                dispatcher.fulfill_order(&CallContext::new(ADMIN), req).await
            }));
        }

        let mut wins = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(e) => {
                    assert_eq!(e.code(), Code::FailedPrecondition);
                    rejected += 1;
                }
            }
        }
        assert_eq!((wins, rejected), (1, 1));
        assert_eq!(h.stock(widget).await, 3);
    }

    async fn shared_stock_never_goes_negative(h: Harness) {
        let widget = h.item("Widget", 5, 999).await;
        let mut orders = Vec::new();
        for _ in 0..5 {
            orders.push(h.order(&[(widget, 2)]).await);
        }

        let mut handles = Vec::new();
        for order in orders {
            let dispatcher = h.dispatcher.clone();
            handles.push(tokio::spawn(async move {
                dispatcher
                    .fulfill_order(
                        &CallContext::new(ADMIN),
                        FulfillOrderRequest {
                            order_id: order.id.to_string(),
                        },
                    )
                    .await
            }));
        }

        let mut wins = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(e) => assert_eq!(e.code(), Code::FailedPrecondition),
            }
        }
        assert_eq!(wins, 2);
        assert_eq!(h.stock(widget).await, 1);
    }

    async fn customer_cannot_mutate_inventory(h: Harness) {
        let err = h
            .dispatcher
            .create_item(
                &h.customer(),
                CreateItemRequest {
                    name: "Contraband".to_string(),
                    description: String::new(),
                    quantity: 1,
                    unit_price: Money::new(1, "USD"),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::PermissionDenied);

        let items = h
            .store
            .list_items(&ItemFilter::default(), PageRequest::new(1, 10).unwrap())
            .await
            .unwrap();
        assert_eq!(items.total, 0);

        let audit = h
            .audit
            .entries_for(CUSTOMER, PageRequest::new(1, 10).unwrap())
            .await
            .unwrap();
        assert_eq!(audit.total, 0);
    }

    async fn deleted_item_blocks_fulfillment(h: Harness) {
        let widget = h.item("Widget", 5, 999).await;
        let order = h.order(&[(widget, 1)]).await;

        let deleted = h
            .dispatcher
            .delete_item(
                &h.admin(),
                DeleteItemRequest {
                    id: widget.to_string(),
                },
            )
            .await
            .unwrap();
        assert!(deleted.success);

        let err = h.fulfill(&order).await.unwrap_err();
        assert_eq!(err.code(), Code::FailedPrecondition);
    }

    async fn listings_page_and_count(h: Harness) {
        for name in ["Widget B", "Gadget", "Widget A", "Widget C"] {
            h.item(name, 1, 100).await;
        }

        let page = h
            .dispatcher
            .list_items(
                &h.customer(),
                ListItemsRequest {
                    name_filter: "Widget".to_string(),
                    page: 1,
                    page_size: 2,
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        let names: Vec<_> = page.records.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Widget A", "Widget B"]);

        let beyond = h
            .dispatcher
            .list_items(
                &h.customer(),
                ListItemsRequest {
                    name_filter: String::new(),
                    page: 9,
                    page_size: 10,
                },
            )
            .await
            .unwrap();
        assert_eq!(beyond.total, 4);
        assert!(beyond.records.is_empty());
    }

    async fn name_filter_ignores_case(h: Harness) {
        h.item("Widget", 1, 100).await;
        h.item("WIDGET XL", 1, 100).await;
        h.item("50% off", 1, 100).await;

        assert_eq!(h.item_names("widget").await, ["WIDGET XL", "Widget"]);
        assert_eq!(h.item_names("xL").await, ["WIDGET XL"]);
        // % is matched literally, not as a wildcard.
        assert_eq!(h.item_names("%").await, ["50% off"]);
        assert!(h.item_names("w%t").await.is_empty());
    }

    async fn audit_trail_records_outcomes(h: Harness) {
        let widget = h.item("Widget", 1, 999).await;
        let order = h.order(&[(widget, 5)]).await;
        let _ = h.fulfill(&order).await;

        let logs = h
            .dispatcher
            .audit_logs(
                &h.admin(),
                AuditLogsRequest {
                    api_key: ADMIN.to_string(),
                    page: 1,
                    page_size: 10,
                },
            )
            .await
            .unwrap();
        assert_eq!(logs.total, 2);
        assert_eq!(logs.records[0].method, "FulfillOrder");
        assert_eq!(logs.records[0].status, "FailedPrecondition");
        assert_eq!(logs.records[1].method, "CreateItem");
        assert_eq!(logs.records[1].status, "success");

        let customer_logs = h
            .audit
            .entries_for(CUSTOMER, PageRequest::new(1, 10).unwrap())
            .await
            .unwrap();
        assert_eq!(customer_logs.total, 1);
        assert_eq!(customer_logs.records[0].method, "CreateOrder");
        assert!(customer_logs.records[0].request_data.contains(&widget.to_string()));
    }
}
