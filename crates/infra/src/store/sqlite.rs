//! SQLite-backed store.
//!
//! ## Concurrency
//!
//! The database runs in WAL mode with a busy timeout, so readers never block
//! the writer. Write transactions are additionally serialized in-process by a
//! write gate held from `begin` until commit or drop. Two fulfillments racing
//! on the same order therefore run one after the other: the second observes
//! `FULFILLED` and fails its status check instead of surfacing `SQLITE_BUSY`.
//!
//! Stock decrements and status transitions are still conditional updates
//! checked by affected-row count, so they stay correct even without the gate.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Database (unique / primary key violation) | `Duplicate` |
//! | Database (other) | `Backend` |
//! | Decode / ColumnDecode | `Corrupt` |
//! | anything else | `Backend` |

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteRow,
};
use sqlx::{Decode, Row, Sqlite, Transaction, Type};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::instrument;
use uuid::Uuid;

use stockflow_auth::{CredentialError, CredentialStore, Role};
use stockflow_core::{ItemId, Money, OrderId, Page, PageRequest, ShipmentId};
use stockflow_inventory::{Item, ItemFilter};
use stockflow_sales::{Order, OrderLine, OrderStatus};
use stockflow_shipping::{Shipment, ShipmentFilter, ShipmentUpdate};

use super::r#trait::{Store, StoreError, StoreTx};
use crate::audit::{AuditLogEntry, AuditSink, NewAuditEntry};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        api_key TEXT PRIMARY KEY,
        role    TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS items (
        id          TEXT PRIMARY KEY,
        name        TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        quantity    INTEGER NOT NULL CHECK (quantity >= 0),
        unit_price  INTEGER NOT NULL CHECK (unit_price >= 0),
        currency    TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id          TEXT PRIMARY KEY,
        customer_id TEXT NOT NULL,
        total       INTEGER NOT NULL,
        currency    TEXT NOT NULL,
        status      TEXT NOT NULL,
        created_at  TEXT NOT NULL
    )
    "#,
    // item_id has no foreign key: items can be deleted while orders reference them.
    r#"
    CREATE TABLE IF NOT EXISTS order_items (
        order_id TEXT NOT NULL REFERENCES orders(id),
        item_id  TEXT NOT NULL,
        quantity INTEGER NOT NULL CHECK (quantity > 0),
        position INTEGER NOT NULL,
        PRIMARY KEY (order_id, item_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS shipments (
        id              TEXT PRIMARY KEY,
        order_id        TEXT NOT NULL REFERENCES orders(id),
        status          TEXT NOT NULL,
        tracking_number TEXT NOT NULL,
        updated_at      TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_shipments_order_id ON shipments (order_id)",
    r#"
    CREATE TABLE IF NOT EXISTS audit_logs (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        api_key      TEXT NOT NULL,
        method       TEXT NOT NULL,
        request_data TEXT NOT NULL,
        status       TEXT NOT NULL,
        timestamp    TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_audit_logs_api_key ON audit_logs (api_key, id)",
];

/// Connection settings for [`SqliteStore::connect`].
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    pub url: String,
    pub max_connections: u32,
    pub busy_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    write_gate: Arc<Mutex<()>>,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `options.url` and apply the schema.
    pub async fn connect(options: &SqliteOptions) -> Result<Self, StoreError> {
        let connect = SqliteConnectOptions::from_str(&options.url)
            .map_err(|e| map_sqlx_error("parse database url", e))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(options.busy_timeout)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections.max(1))
            .connect_with(connect)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        Self::with_pool(pool).await
    }

    /// A private in-memory database (tests/dev).
    ///
    /// Every connection to `sqlite::memory:` opens a fresh database, so the
    /// pool is pinned to one connection that is never recycled.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let connect = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| map_sqlx_error("parse database url", e))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| map_sqlx_error("apply schema", e))?;
        }
        Ok(Self {
            pool,
            write_gate: Arc::new(Mutex::new(())),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Provision (or replace) a credential.
    #[instrument(skip(self, api_key), fields(role = %role), err)]
    pub async fn provision_credential(&self, api_key: &str, role: &Role) -> Result<(), StoreError> {
        let _gate = self.write_gate.lock().await;
        sqlx::query(
            r#"
            INSERT INTO users (api_key, role) VALUES (?1, ?2)
            ON CONFLICT (api_key) DO UPDATE SET role = excluded.role
            "#,
        )
        .bind(api_key)
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("provision_credential", e))?;
        Ok(())
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        // Gate before connection, or a one-connection pool can deadlock.
        let gate = Arc::clone(&self.write_gate).lock_owned().await;
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        Ok(Box::new(SqliteTx { tx, _gate: gate }))
    }

    #[instrument(level = "debug", skip(self), fields(item_id = %id), err)]
    async fn item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, quantity, unit_price, currency, updated_at
            FROM items WHERE id = ?1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("item", e))?;

        row.as_ref().map(item_from_row).transpose()
    }

    #[instrument(level = "debug", skip(self), err)]
    async fn list_items(
        &self,
        filter: &ItemFilter,
        page: PageRequest,
    ) -> Result<Page<Item>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("list_items", e))?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM items WHERE (?1 = '' OR instr(lower(name), lower(?1)) > 0)",
        )
        .bind(&filter.name_contains)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("list_items count", e))?;

        let rows = sqlx::query(
            r#"
            SELECT id, name, description, quantity, unit_price, currency, updated_at
            FROM items
            WHERE (?1 = '' OR instr(lower(name), lower(?1)) > 0)
            ORDER BY name, id
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(&filter.name_contains)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("list_items", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("list_items", e))?;

        let records = rows.iter().map(item_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(records, count(total)))
    }

    #[instrument(level = "debug", skip(self), fields(order_id = %id), err)]
    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        // One read transaction: the order row and its lines come from the same snapshot.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("order", e))?;
        let order = load_order(&mut tx, id).await?;
        tx.commit().await.map_err(|e| map_sqlx_error("order", e))?;
        Ok(order)
    }

    #[instrument(level = "debug", skip(self), err)]
    async fn list_shipments(
        &self,
        filter: &ShipmentFilter,
        page: PageRequest,
    ) -> Result<Page<Shipment>, StoreError> {
        let order_id = filter.order_id.map(|id| id.to_string());
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("list_shipments", e))?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM shipments WHERE (?1 IS NULL OR order_id = ?1)")
                .bind(&order_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("list_shipments count", e))?;

        // v7 ids sort in creation order
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, status, tracking_number, updated_at
            FROM shipments
            WHERE (?1 IS NULL OR order_id = ?1)
            ORDER BY id
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(&order_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("list_shipments", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("list_shipments", e))?;

        let records = rows
            .iter()
            .map(shipment_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(records, count(total)))
    }
}

/// Open write transaction plus the write gate it holds.
///
/// Dropping it without `commit` rolls the transaction back and releases the gate.
struct SqliteTx {
    tx: Transaction<'static, Sqlite>,
    _gate: OwnedMutexGuard<()>,
}

#[async_trait]
impl StoreTx for SqliteTx {
    #[instrument(level = "debug", skip(self, item), fields(item_id = %item.id), err)]
    async fn insert_item(&mut self, item: &Item) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO items (id, name, description, quantity, unit_price, currency, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(item.id.to_string())
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.unit_price.value)
        .bind(&item.unit_price.currency)
        .bind(item.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_item", e))?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self, item), fields(item_id = %item.id), err)]
    async fn update_item(&mut self, item: &Item) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET name = ?1, description = ?2, quantity = ?3, unit_price = ?4,
                currency = ?5, updated_at = ?6
            WHERE id = ?7
            "#,
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.unit_price.value)
        .bind(&item.unit_price.currency)
        .bind(item.updated_at)
        .bind(item.id.to_string())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_item", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(level = "debug", skip(self), fields(item_id = %id), err)]
    async fn delete_item(&mut self, id: ItemId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn item_price(&mut self, id: ItemId) -> Result<Option<Money>, StoreError> {
        let row = sqlx::query("SELECT unit_price, currency FROM items WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("item_price", e))?;

        row.map(|row| {
            Ok(Money::new(
                col::<i64>(&row, "unit_price")?,
                col::<String>(&row, "currency")?,
            ))
        })
        .transpose()
    }

    #[instrument(level = "debug", skip(self), fields(item_id = %id), err)]
    async fn decrement_stock(&mut self, id: ItemId, quantity: i64) -> Result<bool, StoreError> {
        if quantity <= 0 {
            return Ok(false);
        }
        let result = sqlx::query(
            "UPDATE items SET quantity = quantity - ?1 WHERE id = ?2 AND quantity >= ?1",
        )
        .bind(quantity)
        .bind(id.to_string())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("decrement_stock", e))?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(level = "debug", skip(self, order), fields(order_id = %order.id, lines = order.lines.len()), err)]
    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, total, currency, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(order.id.to_string())
        .bind(&order.customer_id)
        .bind(order.total.value)
        .bind(&order.total.currency)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        for (position, line) in order.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, item_id, quantity, position)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(order.id.to_string())
            .bind(line.item_id.to_string())
            .bind(line.quantity)
            .bind(position as i64)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order line", e))?;
        }
        Ok(())
    }

    async fn order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        load_order(&mut self.tx, id).await
    }

    #[instrument(level = "debug", skip(self), fields(order_id = %id, from = %from, to = %to), err)]
    async fn transition_order(
        &mut self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE orders SET status = ?1 WHERE id = ?2 AND status = ?3")
            .bind(to.as_str())
            .bind(id.to_string())
            .bind(from.as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("transition_order", e))?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(level = "debug", skip(self, shipment), fields(shipment_id = %shipment.id, order_id = %shipment.order_id), err)]
    async fn insert_shipment(&mut self, shipment: &Shipment) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO shipments (id, order_id, status, tracking_number, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(shipment.id.to_string())
        .bind(shipment.order_id.to_string())
        .bind(&shipment.status)
        .bind(&shipment.tracking_number)
        .bind(shipment.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_shipment", e))?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self, update), fields(shipment_id = %update.id), err)]
    async fn update_shipment(
        &mut self,
        update: &ShipmentUpdate,
    ) -> Result<Option<Shipment>, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE shipments SET status = ?1, tracking_number = ?2, updated_at = ?3
            WHERE id = ?4
            "#,
        )
        .bind(&update.status)
        .bind(&update.tracking_number)
        .bind(update.updated_at)
        .bind(update.id.to_string())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_shipment", e))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        load_shipment(&mut self.tx, update.id).await
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let SqliteTx { tx, _gate } = *self;
        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))
    }
}

#[async_trait]
impl AuditSink for SqliteStore {
    #[instrument(level = "debug", skip(self, entry), fields(method = %entry.method), err)]
    async fn append(&self, entry: &NewAuditEntry) -> Result<i64, StoreError> {
        let _gate = self.write_gate.lock().await;
        let result = sqlx::query(
            r#"
            INSERT INTO audit_logs (api_key, method, request_data, status, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&entry.api_key)
        .bind(&entry.method)
        .bind(&entry.request_data)
        .bind(&entry.status)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("append audit entry", e))?;
        Ok(result.last_insert_rowid())
    }

    #[instrument(level = "debug", skip(self, api_key), err)]
    async fn entries_for(
        &self,
        api_key: &str,
        page: PageRequest,
    ) -> Result<Page<AuditLogEntry>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("entries_for", e))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs WHERE api_key = ?1")
            .bind(api_key)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("entries_for count", e))?;

        let rows = sqlx::query(
            r#"
            SELECT id, api_key, method, request_data, status, timestamp
            FROM audit_logs
            WHERE api_key = ?1
            ORDER BY id DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(api_key)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("entries_for", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("entries_for", e))?;

        let records = rows
            .iter()
            .map(|row| {
                Ok(AuditLogEntry {
                    id: col(row, "id")?,
                    api_key: col(row, "api_key")?,
                    method: col(row, "method")?,
                    request_data: col(row, "request_data")?,
                    status: col(row, "status")?,
                    timestamp: col(row, "timestamp")?,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        Ok(Page::new(records, count(total)))
    }
}

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn role_for(&self, api_key: &str) -> Result<Option<Role>, CredentialError> {
        let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE api_key = ?1")
            .bind(api_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CredentialError::Backend(e.to_string()))?;
        Ok(role.map(Role::new))
    }
}

async fn load_order(conn: &mut SqliteConnection, id: OrderId) -> Result<Option<Order>, StoreError> {
    let Some(row) = sqlx::query(
        "SELECT id, customer_id, total, currency, status, created_at FROM orders WHERE id = ?1",
    )
    .bind(id.to_string())
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("load order", e))?
    else {
        return Ok(None);
    };

    let lines = sqlx::query(
        "SELECT item_id, quantity FROM order_items WHERE order_id = ?1 ORDER BY position",
    )
    .bind(id.to_string())
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("load order lines", e))?
    .iter()
    .map(|line| {
        Ok(OrderLine {
            item_id: parse_id(&col::<String>(line, "item_id")?)?,
            quantity: col(line, "quantity")?,
        })
    })
    .collect::<Result<Vec<_>, StoreError>>()?;

    let status: String = col(&row, "status")?;
    Ok(Some(Order {
        id: parse_id(&col::<String>(&row, "id")?)?,
        customer_id: col(&row, "customer_id")?,
        lines,
        total: Money::new(col::<i64>(&row, "total")?, col::<String>(&row, "currency")?),
        status: OrderStatus::parse(&status)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown order status {status:?}")))?,
        created_at: col(&row, "created_at")?,
    }))
}

async fn load_shipment(
    conn: &mut SqliteConnection,
    id: ShipmentId,
) -> Result<Option<Shipment>, StoreError> {
    let row = sqlx::query(
        "SELECT id, order_id, status, tracking_number, updated_at FROM shipments WHERE id = ?1",
    )
    .bind(id.to_string())
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("load shipment", e))?;

    row.as_ref().map(shipment_from_row).transpose()
}

fn item_from_row(row: &SqliteRow) -> Result<Item, StoreError> {
    Ok(Item {
        id: parse_id(&col::<String>(row, "id")?)?,
        name: col(row, "name")?,
        description: col(row, "description")?,
        quantity: col(row, "quantity")?,
        unit_price: Money::new(col::<i64>(row, "unit_price")?, col::<String>(row, "currency")?),
        updated_at: col::<DateTime<Utc>>(row, "updated_at")?,
    })
}

fn shipment_from_row(row: &SqliteRow) -> Result<Shipment, StoreError> {
    Ok(Shipment {
        id: parse_id(&col::<String>(row, "id")?)?,
        order_id: parse_id(&col::<String>(row, "order_id")?)?,
        status: col(row, "status")?,
        tracking_number: col(row, "tracking_number")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn col<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, StoreError>
where
    T: Decode<'r, Sqlite> + Type<Sqlite>,
{
    row.try_get(name).map_err(|e| map_sqlx_error(name, e))
}

fn parse_id<T: From<Uuid>>(raw: &str) -> Result<T, StoreError> {
    Uuid::parse_str(raw)
        .map(T::from)
        .map_err(|e| StoreError::Corrupt(format!("stored id {raw:?}: {e}")))
}

fn count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

/// Map SQLx errors to `StoreError` (see module docs for the table).
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {operation}: {}", db_err.message());
            if db_err.is_unique_violation() {
                StoreError::Duplicate(msg)
            } else {
                StoreError::Backend(msg)
            }
        }
        sqlx::Error::Decode(e) => StoreError::Corrupt(format!("{operation}: {e}")),
        sqlx::Error::ColumnDecode { index, source } => {
            StoreError::Corrupt(format!("{operation}: column {index}: {source}"))
        }
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}
