use serde::Deserialize;

use clinic_core::config::Config;

fn default_port() -> u16 {
    8000
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct ClinicConfig {
    /// PostgreSQL connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// TCP port for the HTTP server (default 8000). Env var: `CLINIC_PORT`.
    #[serde(default = "default_port")]
    pub clinic_port: u16,
    /// bcrypt work factor for new password hashes. Env var: `BCRYPT_COST`.
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Config for ClinicConfig {}

/// Superuser account created by `clinic seed`.
#[derive(Debug, Deserialize)]
pub struct SeedConfig {
    pub superuser_email: String,
    pub superuser_password: String,
    /// Falls back to the email when empty.
    #[serde(default)]
    pub superuser_name: String,
}

impl Config for SeedConfig {}
