pub mod auth;
pub mod uploader;
