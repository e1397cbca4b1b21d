// Module name shadows the `serde` crate; use `::serde` for the external crate.
use ::serde::{Deserialize, Deserializer};

/// Distinguish an absent field from an explicit `null` in partial updates.
///
/// Pair with `#[serde(default, deserialize_with = "...")]`: a missing field
/// stays `None`, `null` becomes `Some(None)`, a value becomes `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
