/// Error raised when the environment does not describe a valid configuration.
#[derive(Debug, thiserror::Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(#[from] envy::Error);

/// Trait for loading configuration from environment variables.
///
/// Implementors derive `serde::Deserialize`; field `database_url` is read from
/// `DATABASE_URL`, and so on. Use `#[serde(default = ...)]` for optional values.
pub trait Config: Sized + serde::de::DeserializeOwned {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::from_env()?)
    }

    /// Load from an explicit list of pairs. Used by tests to avoid touching the process env.
    fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = pairs.into_iter().map(|(k, v)| (k.into(), v.into()));
        Ok(envy::from_iter(vars)?)
    }
}
