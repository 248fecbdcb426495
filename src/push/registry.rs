use crate::error::{PushError, StoreError};
use crate::ports::store::{self, SUBSCRIPTIONS_KEY, Store};
use crate::types::push::Subscription;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub registered: bool,
    pub total: usize,
}

/// In-memory view of the stored subscription set, keyed by endpoint URL.
///
/// Every mutation builds the next set, writes it to the store and only then
/// swaps it in, so readers observe either the old or the new set.
pub(crate) struct SubscriptionRegistry {
    store: Arc<dyn Store>,
    max: usize,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl SubscriptionRegistry {
    pub(crate) fn load(store: Arc<dyn Store>, max: usize) -> Result<Self, StoreError> {
        let subscriptions = store::load_collection(store.as_ref(), SUBSCRIPTIONS_KEY)?;
        Ok(Self {
            store,
            max,
            subscriptions: Mutex::new(subscriptions),
        })
    }

    pub(crate) fn register(&self, subscription: Subscription) -> Result<Registration, PushError> {
        let mut guard = self.subscriptions.lock().expect("subscription registry lock");
        if guard
            .iter()
            .any(|existing| existing.endpoint == subscription.endpoint)
        {
            return Ok(Registration {
                registered: false,
                total: guard.len(),
            });
        }
        if guard.len() >= self.max {
            return Err(PushError::CapacityExceeded { max: self.max });
        }

        let mut next = guard.clone();
        next.push(subscription);
        store::replace_collection(self.store.as_ref(), SUBSCRIPTIONS_KEY, &next)?;
        *guard = next;
        Ok(Registration {
            registered: true,
            total: guard.len(),
        })
    }

    /// Removes every subscription whose endpoint is listed. Unknown endpoints
    /// are ignored. Returns how many were removed.
    pub(crate) fn remove_all(&self, endpoints: &HashSet<&str>) -> Result<usize, StoreError> {
        let mut guard = self.subscriptions.lock().expect("subscription registry lock");
        let next: Vec<Subscription> = guard
            .iter()
            .filter(|subscription| !endpoints.contains(subscription.endpoint.as_str()))
            .cloned()
            .collect();
        let removed = guard.len() - next.len();
        if removed == 0 {
            return Ok(0);
        }
        store::replace_collection(self.store.as_ref(), SUBSCRIPTIONS_KEY, &next)?;
        *guard = next;
        Ok(removed)
    }

    pub(crate) fn replace_all(&self, subscriptions: Vec<Subscription>) -> Result<(), StoreError> {
        let mut guard = self.subscriptions.lock().expect("subscription registry lock");
        store::replace_collection(self.store.as_ref(), SUBSCRIPTIONS_KEY, &subscriptions)?;
        *guard = subscriptions;
        Ok(())
    }

    pub(crate) fn clear(&self) -> Result<(), StoreError> {
        self.replace_all(Vec::new())
    }

    pub(crate) fn snapshot(&self) -> Vec<Subscription> {
        self.subscriptions
            .lock()
            .expect("subscription registry lock")
            .clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.subscriptions
            .lock()
            .expect("subscription registry lock")
            .len()
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use crate::types::push::SubscriptionKeys;

    fn subscription(endpoint: &str) -> Subscription {
        Subscription {
            endpoint: endpoint.to_string(),
            keys: SubscriptionKeys {
                auth: "auth".to_string(),
                p256dh: "p256".to_string(),
            },
        }
    }

    fn registry(max: usize) -> SubscriptionRegistry {
        SubscriptionRegistry::load(Arc::new(MemoryStore::default()), max).expect("load")
    }

    #[test]
    fn register__should_be_idempotent() {
        // Given
        let registry = registry(10);

        // When
        let first = registry
            .register(subscription("https://push.example/1"))
            .expect("first register");
        let second = registry
            .register(subscription("https://push.example/1"))
            .expect("second register");

        // Then
        assert_eq!(
            first,
            Registration {
                registered: true,
                total: 1
            }
        );
        assert_eq!(
            second,
            Registration {
                registered: false,
                total: 1
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn register__should_fail_when_full_and_new() {
        // Given
        let registry = registry(1);
        registry
            .register(subscription("https://push.example/1"))
            .expect("register");

        // When
        let result = registry.register(subscription("https://push.example/2"));

        // Then
        assert!(matches!(
            result,
            Err(PushError::CapacityExceeded { max: 1 })
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn register__should_accept_existing_endpoint_when_full() {
        // Given
        let registry = registry(1);
        registry
            .register(subscription("https://push.example/1"))
            .expect("register");

        // When
        let result = registry
            .register(subscription("https://push.example/1"))
            .expect("register existing");

        // Then
        assert!(!result.registered);
        assert_eq!(result.total, 1);
    }

    #[test]
    fn register__should_admit_one_of_many_concurrent_new_endpoints_at_capacity() {
        // Given
        let registry = Arc::new(registry(1));

        // When
        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|index| {
                    let registry = Arc::clone(&registry);
                    scope.spawn(move || {
                        registry.register(subscription(&format!("https://push.example/{index}")))
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("register thread"))
                .collect()
        });

        // Then
        let registered = results
            .iter()
            .filter(|result| matches!(result, Ok(Registration { registered: true, .. })))
            .count();
        let rejected = results
            .iter()
            .filter(|result| matches!(result, Err(PushError::CapacityExceeded { max: 1 })))
            .count();
        assert_eq!(registered, 1);
        assert_eq!(rejected, 7);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn register__should_store_concurrent_duplicates_once() {
        // Given
        let registry = Arc::new(registry(10));

        // When
        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let registry = Arc::clone(&registry);
                    scope.spawn(move || registry.register(subscription("https://push.example/same")))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("register thread").expect("register"))
                .collect()
        });

        // Then
        assert_eq!(
            results
                .iter()
                .filter(|registration: &&Registration| registration.registered)
                .count(),
            1
        );
        assert!(results.iter().all(|registration| registration.total == 1));
        assert_eq!(registry.snapshot().len(), 1);
    }

    #[test]
    fn remove_all__should_ignore_unknown_endpoints() {
        // Given
        let registry = registry(10);
        registry
            .register(subscription("https://push.example/1"))
            .expect("register 1");
        registry
            .register(subscription("https://push.example/2"))
            .expect("register 2");
        let endpoints: HashSet<&str> = ["https://push.example/2", "https://push.example/unknown"]
            .into_iter()
            .collect();

        // When
        let removed = registry.remove_all(&endpoints).expect("remove");

        // Then
        assert_eq!(removed, 1);
        let remaining: Vec<String> = registry
            .snapshot()
            .into_iter()
            .map(|s| s.endpoint)
            .collect();
        assert_eq!(remaining, vec!["https://push.example/1"]);
    }

    #[test]
    fn replace_all__should_swap_and_persist() {
        // Given
        let store = Arc::new(MemoryStore::default());
        let registry = SubscriptionRegistry::load(store.clone(), 10).expect("load");
        registry
            .register(subscription("https://push.example/old"))
            .expect("register");

        // When
        registry
            .replace_all(vec![
                subscription("https://push.example/a"),
                subscription("https://push.example/b"),
            ])
            .expect("replace");

        // Then
        let reloaded = SubscriptionRegistry::load(store, 10).expect("reload");
        let endpoints: Vec<String> = reloaded
            .snapshot()
            .into_iter()
            .map(|s| s.endpoint)
            .collect();
        assert_eq!(
            endpoints,
            vec!["https://push.example/a", "https://push.example/b"]
        );
    }

    #[test]
    fn clear__should_remove_everything() {
        // Given
        let registry = registry(10);
        registry
            .register(subscription("https://push.example/1"))
            .expect("register");

        // When
        registry.clear().expect("clear");

        // Then
        assert_eq!(registry.len(), 0);
    }
}
