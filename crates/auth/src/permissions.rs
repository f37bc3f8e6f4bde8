use serde::{Deserialize, Serialize};

/// Every operation that goes through the policy table.
///
/// The set is closed: adding an operation means adding a variant and a row in
/// [`crate::Policy::standard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    ItemsRead,
    ItemsCreate,
    ItemsUpdate,
    ReceiptsRead,
    ReceiptsCreate,
    ReceiptsAddLine,
    ReceiptsReceiveLine,
    ReceiptsClose,
    OrdersRead,
    OrdersCreate,
    OrdersAddLine,
    OrdersPickLine,
    OrdersPack,
    OrdersShip,
    OrdersClose,
    DashboardRead,
    UsersList,
    UsersCreate,
    UsersUpdate,
    UsersResetPassword,
    UsersDelete,
    AccountChangePassword,
}

impl Permission {
    pub const ALL: [Permission; 22] = [
        Permission::ItemsRead,
        Permission::ItemsCreate,
        Permission::ItemsUpdate,
        Permission::ReceiptsRead,
        Permission::ReceiptsCreate,
        Permission::ReceiptsAddLine,
        Permission::ReceiptsReceiveLine,
        Permission::ReceiptsClose,
        Permission::OrdersRead,
        Permission::OrdersCreate,
        Permission::OrdersAddLine,
        Permission::OrdersPickLine,
        Permission::OrdersPack,
        Permission::OrdersShip,
        Permission::OrdersClose,
        Permission::DashboardRead,
        Permission::UsersList,
        Permission::UsersCreate,
        Permission::UsersUpdate,
        Permission::UsersResetPassword,
        Permission::UsersDelete,
        Permission::AccountChangePassword,
    ];

    /// Dotted name, e.g. `"orders.pick_line"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ItemsRead => "items.read",
            Permission::ItemsCreate => "items.create",
            Permission::ItemsUpdate => "items.update",
            Permission::ReceiptsRead => "receipts.read",
            Permission::ReceiptsCreate => "receipts.create",
            Permission::ReceiptsAddLine => "receipts.add_line",
            Permission::ReceiptsReceiveLine => "receipts.receive_line",
            Permission::ReceiptsClose => "receipts.close",
            Permission::OrdersRead => "orders.read",
            Permission::OrdersCreate => "orders.create",
            Permission::OrdersAddLine => "orders.add_line",
            Permission::OrdersPickLine => "orders.pick_line",
            Permission::OrdersPack => "orders.pack",
            Permission::OrdersShip => "orders.ship",
            Permission::OrdersClose => "orders.close",
            Permission::DashboardRead => "dashboard.read",
            Permission::UsersList => "users.list",
            Permission::UsersCreate => "users.create",
            Permission::UsersUpdate => "users.update",
            Permission::UsersResetPassword => "users.reset_password",
            Permission::UsersDelete => "users.delete",
            Permission::AccountChangePassword => "account.change_password",
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
