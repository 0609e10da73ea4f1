// handlers/mod.rs - two security tiers
//
// Public (no auth): service info, health and the respondent submission endpoints.
// Protected (JWT auth): everything a team member does to build and publish forms.

pub mod protected;
pub mod public;
