pub mod activity;
pub mod comment;
pub mod request;
