pub mod catalog;
pub mod condition;
pub mod effect;
pub mod one_or_many;
pub mod scene;
pub mod stat;

use serde::{Deserialize, Deserializer};

/// Deserialize an optional field written without `Some(..)` in RON.
pub(crate) fn bare_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
