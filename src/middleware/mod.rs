pub mod auth;
pub mod client_ip;
pub mod extract;
pub mod rate_limit;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use client_ip::client_ip;
pub use extract::{ApiJson, ApiPath};
pub use rate_limit::{rate_limit_middleware, RateLimiter};
pub use response::{ApiResponse, ApiResult};
