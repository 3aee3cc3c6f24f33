pub mod activities;
pub mod comments;
pub mod orders;
pub mod registrations;
pub mod users;
