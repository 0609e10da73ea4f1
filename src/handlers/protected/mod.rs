// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Route prefix: /api/v1. Every handler receives the caller as `Extension<AuthUser>`
// and passes the user id down; the services decide team membership and ownership.

pub mod dashboard;
pub mod edges;
pub mod forms;
pub mod projects;
pub mod questions;
pub mod responses;
pub mod teams;
pub mod uploads;
pub mod versions;
