use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use stockflow_auth::{CredentialError, CredentialStore, InMemoryCredentialStore, Role};
use stockflow_core::{ItemId, Money, OrderId, Page, PageRequest, ShipmentId};
use stockflow_inventory::{Item, ItemFilter};
use stockflow_sales::{Order, OrderStatus};
use stockflow_shipping::{Shipment, ShipmentFilter, ShipmentUpdate};

use super::r#trait::{Store, StoreError, StoreTx};
use crate::audit::{AuditLogEntry, AuditSink, NewAuditEntry};

#[derive(Debug, Default, Clone)]
struct Tables {
    items: HashMap<ItemId, Item>,
    orders: HashMap<OrderId, Order>,
    // v7 ids sort in creation order
    shipments: BTreeMap<ShipmentId, Shipment>,
}

#[derive(Debug, Default)]
struct AuditTable {
    last_id: i64,
    entries: Vec<AuditLogEntry>,
}

/// In-memory store.
///
/// Intended for tests/dev. A write transaction holds the table lock for its
/// whole lifetime and works on a private copy that replaces the tables on
/// commit.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    audit: Arc<RwLock<AuditTable>>,
    credentials: Arc<InMemoryCredentialStore>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision (or replace) a credential.
    pub fn provision_credential(&self, api_key: impl Into<String>, role: Role) {
        self.credentials.insert(api_key, role);
    }
}

fn paginate<T>(records: Vec<T>, page: PageRequest) -> Page<T> {
    let total = records.len() as u64;
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    Page::new(records.into_iter().skip(offset).take(limit).collect(), total)
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryTx { guard, staged }))
    }

    async fn item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        Ok(self.tables.lock().await.items.get(&id).cloned())
    }

    async fn list_items(
        &self,
        filter: &ItemFilter,
        page: PageRequest,
    ) -> Result<Page<Item>, StoreError> {
        let mut matching: Vec<Item> = {
            let tables = self.tables.lock().await;
            tables.items.values().filter(|i| filter.matches(i)).cloned().collect()
        };
        matching.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(paginate(matching, page))
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.tables.lock().await.orders.get(&id).cloned())
    }

    async fn list_shipments(
        &self,
        filter: &ShipmentFilter,
        page: PageRequest,
    ) -> Result<Page<Shipment>, StoreError> {
        let matching: Vec<Shipment> = {
            let tables = self.tables.lock().await;
            tables.shipments.values().filter(|s| filter.matches(s)).cloned().collect()
        };
        Ok(paginate(matching, page))
    }
}

struct InMemoryTx {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn insert_item(&mut self, item: &Item) -> Result<(), StoreError> {
        if self.staged.items.contains_key(&item.id) {
            return Err(StoreError::Duplicate(format!("item {}", item.id)));
        }
        self.staged.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_item(&mut self, item: &Item) -> Result<bool, StoreError> {
        match self.staged.items.get_mut(&item.id) {
            Some(existing) => {
                *existing = item.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_item(&mut self, id: ItemId) -> Result<bool, StoreError> {
        Ok(self.staged.items.remove(&id).is_some())
    }

    async fn item_price(&mut self, id: ItemId) -> Result<Option<Money>, StoreError> {
        Ok(self.staged.items.get(&id).map(|i| i.unit_price.clone()))
    }

    async fn decrement_stock(&mut self, id: ItemId, quantity: i64) -> Result<bool, StoreError> {
        Ok(self
            .staged
            .items
            .get_mut(&id)
            .is_some_and(|item| item.try_decrement(quantity)))
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        if self.staged.orders.contains_key(&order.id) {
            return Err(StoreError::Duplicate(format!("order {}", order.id)));
        }
        self.staged.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.staged.orders.get(&id).cloned())
    }

    async fn transition_order(
        &mut self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, StoreError> {
        match self.staged.orders.get_mut(&id) {
            Some(order) if order.status == from => {
                order.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_shipment(&mut self, shipment: &Shipment) -> Result<(), StoreError> {
        if self.staged.shipments.contains_key(&shipment.id) {
            return Err(StoreError::Duplicate(format!("shipment {}", shipment.id)));
        }
        self.staged.shipments.insert(shipment.id, shipment.clone());
        Ok(())
    }

    async fn update_shipment(
        &mut self,
        update: &ShipmentUpdate,
    ) -> Result<Option<Shipment>, StoreError> {
        Ok(self.staged.shipments.get_mut(&update.id).map(|shipment| {
            update.apply_to(shipment);
            shipment.clone()
        }))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryTx { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

#[async_trait]
impl AuditSink for InMemoryStore {
    async fn append(&self, entry: &NewAuditEntry) -> Result<i64, StoreError> {
        let mut audit = self
            .audit
            .write()
            .map_err(|_| StoreError::Backend("audit table lock poisoned".to_string()))?;
        audit.last_id += 1;
        let id = audit.last_id;
        audit.entries.push(AuditLogEntry {
            id,
            api_key: entry.api_key.clone(),
            method: entry.method.clone(),
            request_data: entry.request_data.clone(),
            status: entry.status.clone(),
            timestamp: entry.timestamp,
        });
        Ok(id)
    }

    async fn entries_for(
        &self,
        api_key: &str,
        page: PageRequest,
    ) -> Result<Page<AuditLogEntry>, StoreError> {
        let audit = self
            .audit
            .read()
            .map_err(|_| StoreError::Backend("audit table lock poisoned".to_string()))?;
        let matching: Vec<AuditLogEntry> = audit
            .entries
            .iter()
            .rev()
            .filter(|e| e.api_key == api_key)
            .cloned()
            .collect();
        Ok(paginate(matching, page))
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn role_for(&self, api_key: &str) -> Result<Option<Role>, CredentialError> {
        self.credentials.role_for(api_key).await
    }
}
