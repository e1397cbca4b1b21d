//! sea-orm entities for the clinic database.

pub mod auth_tokens;
pub mod group_permissions;
pub mod groups;
pub mod patients;
pub mod permissions;
pub mod reservations;
pub mod roles;
pub mod user_groups;
pub mod users;
