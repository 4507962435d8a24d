use serde::{Deserialize, Serialize};

/// Every remotely invocable operation. The gate authorizes by method name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Method {
    CreateItem,
    UpdateItem,
    DeleteItem,
    ListItems,
    CreateOrder,
    FulfillOrder,
    GetOrder,
    CreateShipment,
    UpdateShipment,
    ListShipments,
    AuditLogs,
}

impl Method {
    pub const ALL: [Method; 11] = [
        Method::CreateItem,
        Method::UpdateItem,
        Method::DeleteItem,
        Method::ListItems,
        Method::CreateOrder,
        Method::FulfillOrder,
        Method::GetOrder,
        Method::CreateShipment,
        Method::UpdateShipment,
        Method::ListShipments,
        Method::AuditLogs,
    ];

    /// Name recorded in the audit trail.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::CreateItem => "CreateItem",
            Method::UpdateItem => "UpdateItem",
            Method::DeleteItem => "DeleteItem",
            Method::ListItems => "ListItems",
            Method::CreateOrder => "CreateOrder",
            Method::FulfillOrder => "FulfillOrder",
            Method::GetOrder => "GetOrder",
            Method::CreateShipment => "CreateShipment",
            Method::UpdateShipment => "UpdateShipment",
            Method::ListShipments => "ListShipments",
            Method::AuditLogs => "AuditLogs",
        }
    }
}

impl core::fmt::Display for Method {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_distinct() {
        let names: std::collections::HashSet<_> = Method::ALL.iter().map(|m| m.as_str()).collect();
        assert_eq!(names.len(), Method::ALL.len());
    }
}
