//! Command-line surface: one subcommand per remote operation.

use clap::{Args, Parser, Subcommand};
use reqwest::Method as HttpMethod;
use serde_json::{json, Value};

#[derive(Debug, Parser)]
#[command(name = "stockflow")]
#[command(about = "StockFlow command-line client", long_about = None)]
pub struct Cli {
    /// Base URL of the StockFlow API.
    #[arg(long, global = true, default_value = "http://127.0.0.1:8089")]
    pub server: String,

    /// Credential sent in the `api-key` header.
    #[arg(long = "api-key", global = true)]
    pub api_key: Option<String>,

    /// Per-call deadline in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(flatten)]
    Call(Operation),

    /// Stock an item, then order, fulfill, ship, and restock it
    Demo,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Operation {
    /// Create an inventory item
    CreateItem {
        #[command(flatten)]
        item: ItemArgs,
    },

    /// Replace every mutable field of an item
    UpdateItem {
        #[arg(long)]
        id: String,

        #[command(flatten)]
        item: ItemArgs,
    },

    /// Delete an item
    DeleteItem {
        #[arg(long)]
        id: String,
    },

    /// List items, optionally filtered by a name substring
    ListItems {
        #[arg(long, default_value = "")]
        name_filter: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Place an order for one customer
    CreateOrder {
        #[arg(long)]
        customer: String,

        /// `ITEM_ID:QUANTITY`, repeat for more lines
        #[arg(long = "line", value_parser = parse_line, required = true)]
        lines: Vec<OrderLine>,
    },

    /// Decrement stock and mark a pending order fulfilled
    FulfillOrder {
        #[arg(long)]
        order: String,
    },

    /// Print one order
    GetOrder {
        #[arg(long)]
        order: String,
    },

    /// Open a shipment for a fulfilled order
    CreateShipment {
        #[arg(long)]
        order: String,

        #[arg(long)]
        tracking: String,
    },

    /// Set a shipment's status and tracking number
    UpdateShipment {
        #[arg(long)]
        id: String,

        /// PENDING | SHIPPED | DELIVERED
        #[arg(long)]
        status: String,

        /// Replaces the stored number; an empty value clears it
        #[arg(long)]
        tracking: String,
    },

    /// List shipments, optionally for one order
    ListShipments {
        #[arg(long, default_value = "")]
        order: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Audit entries recorded under one credential, newest first
    Audit {
        /// Credential whose entries are listed
        #[arg(long)]
        key: String,

        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct ItemArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long)]
    pub quantity: i64,

    /// Unit price as a decimal amount, e.g. `1000.00`
    #[arg(long, value_parser = parse_price)]
    pub price: i64,

    #[arg(long, default_value = "USD")]
    pub currency: String,
}

impl ItemArgs {
    fn body(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "quantity": self.quantity,
            "unit_price": { "value": self.price, "currency": self.currency },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Args)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: i64,

    #[arg(long, default_value_t = 10)]
    pub page_size: i64,
}

impl PageArgs {
    fn query(&self) -> [(&'static str, String); 2] {
        [
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub item_id: String,
    pub quantity: i64,
}

/// One HTTP request against the API, before the server URL is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCall {
    pub method: HttpMethod,
    /// Path segments, percent-encoded by the client.
    pub path: Vec<String>,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl ApiCall {
    fn new(method: HttpMethod, path: &[&str]) -> Self {
        Self {
            method,
            path: path.iter().map(|s| s.to_string()).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    fn query(mut self, pairs: impl IntoIterator<Item = (&'static str, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

impl Operation {
    pub fn api_call(&self) -> ApiCall {
        match self {
            Operation::CreateItem { item } => {
                ApiCall::new(HttpMethod::POST, &["items"]).body(item.body())
            }
            Operation::UpdateItem { id, item } => {
                ApiCall::new(HttpMethod::PUT, &["items", id.as_str()]).body(item.body())
            }
            Operation::DeleteItem { id } => ApiCall::new(HttpMethod::DELETE, &["items", id.as_str()]),
            Operation::ListItems { name_filter, page } => ApiCall::new(HttpMethod::GET, &["items"])
                .query([("name_filter", name_filter.clone())])
                .query(page.query()),
            Operation::CreateOrder { customer, lines } => {
                let lines: Vec<Value> = lines
                    .iter()
                    .map(|l| json!({ "item_id": l.item_id, "quantity": l.quantity }))
                    .collect();
                ApiCall::new(HttpMethod::POST, &["orders"])
                    .body(json!({ "customer_id": customer, "lines": lines }))
            }
            Operation::FulfillOrder { order } => {
                ApiCall::new(HttpMethod::POST, &["orders", order.as_str(), "fulfill"])
            }
            Operation::GetOrder { order } => ApiCall::new(HttpMethod::GET, &["orders", order.as_str()]),
            Operation::CreateShipment { order, tracking } => {
                ApiCall::new(HttpMethod::POST, &["shipments"])
                    .body(json!({ "order_id": order, "tracking_number": tracking }))
            }
            Operation::UpdateShipment {
                id,
                status,
                tracking,
            } => ApiCall::new(HttpMethod::PUT, &["shipments", id.as_str()])
                .body(json!({ "status": status, "tracking_number": tracking })),
            Operation::ListShipments { order, page } => {
                ApiCall::new(HttpMethod::GET, &["shipments"])
                    .query([("order_id", order.clone())])
                    .query(page.query())
            }
            Operation::Audit { key, page } => ApiCall::new(HttpMethod::GET, &["audit-logs"])
                .query([("api_key", key.clone())])
                .query(page.query()),
        }
    }
}

/// Parse a decimal amount such as `1000.00` into minor units.
pub fn parse_price(raw: &str) -> Result<i64, String> {
    let (whole, frac) = raw.split_once('.').unwrap_or((raw, ""));
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() || !digits(whole) || frac.len() > 2 || !digits(frac) {
        return Err(format!("{raw:?} is not an amount like 12.50"));
    }
    let too_large = || format!("{raw:?} is too large");
    let whole: i64 = whole.parse().map_err(|_| too_large())?;
    let minor: i64 = format!("{frac:0<2}").parse().map_err(|_| too_large())?;
    whole
        .checked_mul(100)
        .and_then(|v| v.checked_add(minor))
        .ok_or_else(too_large)
}

fn parse_line(raw: &str) -> Result<OrderLine, String> {
    let (item_id, quantity) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("{raw:?} is not ITEM_ID:QUANTITY"))?;
    let quantity = quantity
        .parse()
        .map_err(|_| format!("{quantity:?} is not a quantity"))?;
    Ok(OrderLine {
        item_id: item_id.to_string(),
        quantity,
    })
}
