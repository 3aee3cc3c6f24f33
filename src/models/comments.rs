#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentsRow {
    pub comment_id: String,
    pub user_id: String,
    pub activity_id: String,
    pub content: String,
    pub rating: Option<i64>,
    pub created_at: String,
}

// Comment joined with the author's public name fields.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityCommentRow {
    pub comment_id: String,
    pub user_id: String,
    pub activity_id: String,
    pub content: String,
    pub rating: Option<i64>,
    pub created_at: String,
    pub username: Option<String>,
    pub real_name: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RatingCountRow {
    pub rating: i64,
    pub rating_count: i64,
}
