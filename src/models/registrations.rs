#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistrationsRow {
    pub registration_id: String,
    pub user_id: String,
    pub activity_id: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

// Registration joined with a snapshot of its activity, for "my registrations" lists.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRegistrationRow {
    pub registration_id: String,
    pub activity_id: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub activity_title: Option<String>,
    pub activity_start_time: Option<String>,
    pub activity_location: Option<String>,
}

// Confirmed registration joined with user contact fields, for organizer views.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityRegistrantRow {
    pub registration_id: String,
    pub user_id: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub username: String,
    pub real_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
}
