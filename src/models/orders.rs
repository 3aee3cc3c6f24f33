#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrdersRow {
    pub order_id: String,
    pub order_number: String,
    pub user_id: String,
    pub activity_id: String,
    pub activity_title: String,
    pub amount: f64,
    pub status: String,
    pub payment_status: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

// One row per order status, used to build the per-user stats summary.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderStatusCountRow {
    pub status: String,
    pub order_count: i64,
    pub amount_sum: Option<f64>,
}
