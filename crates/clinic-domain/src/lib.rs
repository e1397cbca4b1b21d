//! Domain types shared across the clinic crates.
//!
//! Pure types with no framework dependencies: the permission catalog,
//! the staff groups with their policy table, and the role vocabulary.

pub mod group;
pub mod permission;
pub mod role;
