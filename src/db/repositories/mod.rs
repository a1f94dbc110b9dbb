pub mod activity;
pub mod role;
pub mod user;
