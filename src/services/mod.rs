pub mod auth_service;
pub mod emails;
pub mod mailer;
pub mod member_service;
pub mod oauth_service;
pub mod one_time_token_service;
pub mod rate_limiter;
pub mod session_service;
