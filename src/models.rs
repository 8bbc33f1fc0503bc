use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account role, checked against a per-endpoint allow-list.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub name: String,
    pub phone: String,
    pub preferences: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Note {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub tags: Option<String>,
    pub updated_at: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Feedback {
    pub id: i64,
    pub user_id: Option<i64>,
    pub message: String,
    pub rating: Option<i64>,
    pub created_at: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub price: f64,
    pub stock: i64,
    pub description: Option<String>,
    pub tags: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: String,
}

/// An order line joined against the catalog; `product_name` is None when the
/// product has since been removed.
#[derive(Serialize, Debug, Clone, FromRow)]
pub struct OrderItemDetail {
    pub product_id: i64,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub price: f64,
}

#[derive(Serialize, Debug, Clone)]
pub struct OrderPayload {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
}

/// Feedback entry as shown to admins.
#[derive(Serialize, Debug, Clone)]
pub struct FeedbackView {
    pub id: i64,
    pub message: String,
    pub rating: Option<i64>,
    pub created_at: String,
    pub user: String,
}

/// One ephemeral cart line, stored in the session rather than the database.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CartEntry {
    pub product_id: i64,
    pub quantity: i64,
}

/// A cart line joined against live product data for display.
#[derive(Serialize, Debug, Clone)]
pub struct CartItemView {
    pub product: Product,
    pub quantity: i64,
    pub subtotal: f64,
}
