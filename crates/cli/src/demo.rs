//! Scripted walk through one order's life, run against a live server.

use anyhow::Context;
use serde_json::{json, Value};

use crate::cli::{ItemArgs, Operation, OrderLine, PageArgs};
use crate::client::ApiClient;

/// Ids created by [`run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoSummary {
    pub item_id: String,
    pub order_id: String,
    pub shipment_id: String,
}

impl DemoSummary {
    pub fn to_json(&self) -> Value {
        json!({
            "item_id": self.item_id,
            "order_id": self.order_id,
            "shipment_id": self.shipment_id,
        })
    }
}

fn laptop(quantity: i64) -> ItemArgs {
    ItemArgs {
        name: "Laptop".to_string(),
        description: "High-performance laptop".to_string(),
        quantity,
        price: 100_000,
        currency: "USD".to_string(),
    }
}

fn id_of(body: &Value) -> anyhow::Result<String> {
    body["id"]
        .as_str()
        .map(str::to_string)
        .context("response has no id")
}

/// Create an item, order and fulfill one unit, ship it, restock, and list.
///
/// Needs a credential allowed to call every operation used here.
pub async fn run(client: &ApiClient) -> anyhow::Result<DemoSummary> {
    let send = |op: Operation| async move { client.send(&op.api_call()).await };

    let item = send(Operation::CreateItem { item: laptop(10) })
        .await
        .context("create item")?;
    let item_id = id_of(&item)?;
    tracing::info!(%item_id, "created item");

    let order = send(Operation::CreateOrder {
        customer: "CUST001".to_string(),
        lines: vec![OrderLine {
            item_id: item_id.clone(),
            quantity: 1,
        }],
    })
    .await
    .context("create order")?;
    let order_id = id_of(&order)?;
    tracing::info!(%order_id, total = %order["total"]["display_value"], "created order");

    send(Operation::FulfillOrder {
        order: order_id.clone(),
    })
    .await
    .context("fulfill order")?;
    tracing::info!(%order_id, "fulfilled order");

    let shipment = send(Operation::CreateShipment {
        order: order_id.clone(),
        tracking: "TRK123456".to_string(),
    })
    .await
    .context("create shipment")?;
    let shipment_id = id_of(&shipment)?;
    tracing::info!(%shipment_id, "created shipment");

    let restocked = send(Operation::UpdateItem {
        id: item_id.clone(),
        item: laptop(10),
    })
    .await
    .context("restock item")?;
    tracing::info!(quantity = %restocked["quantity"], "restocked item");

    let listed = send(Operation::ListItems {
        name_filter: "Laptop".to_string(),
        page: PageArgs {
            page: 1,
            page_size: 10,
        },
    })
    .await
    .context("list items")?;
    tracing::info!(total = %listed["total"], "listed items");

    Ok(DemoSummary {
        item_id,
        order_id,
        shipment_id,
    })
}
