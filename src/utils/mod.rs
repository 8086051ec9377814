pub mod jwt;
pub mod password;
pub mod secure_token;
