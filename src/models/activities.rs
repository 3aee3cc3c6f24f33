#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivitiesRow {
    pub activity_id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: String,
    pub requirements: Option<String>,
    pub image_url: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub price: f64,
    pub max_participants: i64,
    pub current_participants: i64,
    pub status: String,
    pub creator_id: String,
    pub is_deleted: i64,
    pub created_at: String,
    pub updated_at: String,
}
