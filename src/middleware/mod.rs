pub mod auth;
pub mod client;

pub use auth::AuthMember;
pub use client::ClientInfo;
