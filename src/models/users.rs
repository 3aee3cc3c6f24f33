#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UsersRow {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: String,
    pub real_name: Option<String>,
    pub is_active: i64,
    pub created_at: String,
    pub updated_at: String,
}
