//! Serde glue for single-element blocks, stored as `[]` or `[{...}]` in state
//! but also accepted as a bare object or `null`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    value.as_slice().serialize(serializer)
}

pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(OneOrMany::One(item)) => Ok(Some(item)),
        Some(OneOrMany::Many(mut items)) => {
            if items.len() > 1 {
                return Err(D::Error::custom(format!(
                    "expected at most one block, got {}",
                    items.len()
                )));
            }
            Ok(items.pop())
        }
    }
}
