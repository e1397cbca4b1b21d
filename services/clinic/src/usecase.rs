pub mod import;
pub mod patient;
pub mod reservation;
pub mod seed;
pub mod token;
pub mod user;
