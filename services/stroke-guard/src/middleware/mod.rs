pub mod jwt_auth;
pub mod rate_limit;

pub use jwt_auth::JwtAuth;
pub use rate_limit::RateLimiter;
