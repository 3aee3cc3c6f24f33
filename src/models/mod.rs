pub mod activities;
pub mod comments;
pub mod orders;
pub mod registrations;
pub mod users;

pub use activities::ActivitiesRow;
pub use comments::CommentsRow;
pub use orders::OrdersRow;
pub use registrations::RegistrationsRow;
pub use users::UsersRow;
