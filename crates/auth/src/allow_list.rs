//! Static role → permitted-method mapping.

use std::collections::{HashMap, HashSet};

use crate::{Method, Role};

/// Which methods each role may invoke.
///
/// Built once and injected into the gate so the policy can be inspected and
/// tested on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    grants: HashMap<Role, HashSet<Method>>,
}

impl AllowList {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The fixed production policy.
    pub fn standard() -> Self {
        Self::empty()
            .grant(
                Role::CUSTOMER,
                [Method::CreateOrder, Method::ListItems, Method::GetOrder],
            )
            .grant(
                Role::ADMIN,
                [
                    Method::CreateItem,
                    Method::UpdateItem,
                    Method::DeleteItem,
                    Method::CreateOrder,
                    Method::FulfillOrder,
                    Method::GetOrder,
                    Method::CreateShipment,
                    Method::UpdateShipment,
                    Method::ListItems,
                    Method::ListShipments,
                    Method::AuditLogs,
                ],
            )
    }

    pub fn grant(mut self, role: Role, methods: impl IntoIterator<Item = Method>) -> Self {
        self.grants.entry(role).or_default().extend(methods);
        self
    }

    pub fn permits(&self, role: &Role, method: Method) -> bool {
        self.grants
            .get(role)
            .is_some_and(|methods| methods.contains(&method))
    }
}
