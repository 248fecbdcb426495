use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StoreError;

pub const SUBSCRIPTIONS_KEY: &str = "subscriptions";
pub const NOTIFICATIONS_KEY: &str = "notifications";

/// Whole-collection key/value storage: every key holds a JSON array that is
/// read in full and replaced in full.
pub trait Store: Send + Sync + 'static {
    /// Returns the collection stored under `key`, or an empty one.
    fn load(&self, key: &str) -> Result<Vec<Value>, StoreError>;
    fn replace(&self, key: &str, items: Vec<Value>) -> Result<(), StoreError>;
}

pub fn load_collection<T: DeserializeOwned>(
    store: &dyn Store,
    key: &str,
) -> Result<Vec<T>, StoreError> {
    store
        .load(key)?
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(StoreError::from))
        .collect()
}

pub fn replace_collection<T: Serialize>(
    store: &dyn Store,
    key: &str,
    items: &[T],
) -> Result<(), StoreError> {
    let items = items
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    store.replace(key, items)
}
