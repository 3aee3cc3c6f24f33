pub mod activity_service;
pub mod comment_service;
pub mod credential_service;
pub mod error;
pub mod order_service;
pub mod registration_service;
pub mod timefmt;
pub mod user_service;

pub use error::{ServiceError, ServiceResult};
