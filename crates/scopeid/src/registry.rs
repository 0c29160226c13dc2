use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{Identity, ScopeGenerator, TimeSource};

/// Maps scope names to their [`ScopeGenerator`], creating generators lazily.
///
/// Exactly one generator exists per scope name for the registry's lifetime;
/// generators are never removed. Lookups for existing scopes take a shared
/// read lock, and only the first request for a new scope takes the write lock.
/// In both cases the lock is released before the caller touches the
/// generator, so busy scopes do not serialize unrelated ones.
pub struct ScopeRegistry<T>
where
    T: TimeSource + Clone,
{
    identity: Identity,
    time: T,
    generators: RwLock<HashMap<String, Arc<ScopeGenerator<T>>>>,
}

impl<T> ScopeRegistry<T>
where
    T: TimeSource + Clone,
{
    pub fn new(identity: Identity, time: T) -> Self {
        Self {
            identity,
            time,
            generators: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the generator for `scope`, creating it on first use.
    ///
    /// Concurrent first calls for the same scope all receive the same
    /// generator.
    pub fn get_or_create(&self, scope: &str) -> Arc<ScopeGenerator<T>> {
        if let Some(generator) = self.generators.read().get(scope) {
            return Arc::clone(generator);
        }

        let mut generators = self.generators.write();
        // Another caller may have inserted it between the two locks.
        let generator = generators.entry(scope.to_owned()).or_insert_with(|| {
            #[cfg(feature = "tracing")]
            tracing::debug!(scope, "creating generator for new scope");
            Arc::new(ScopeGenerator::new(self.identity, self.time.clone()))
        });
        Arc::clone(generator)
    }

    /// Snapshot of the registered scope names, in no particular order.
    pub fn scopes(&self) -> Vec<String> {
        self.generators.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.generators.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EPOCH;
    use crate::time::mock::MockTime;
    use std::thread::scope;

    fn registry() -> ScopeRegistry<Arc<MockTime>> {
        ScopeRegistry::new(
            Identity::new(1, 1).unwrap(),
            Arc::new(MockTime::new(EPOCH + 1)),
        )
    }

    #[test]
    fn returns_same_generator_for_same_scope() {
        let registry = registry();
        assert!(registry.is_empty());

        let a = registry.get_or_create("orders");
        let b = registry.get_or_create("orders");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn scopes_are_independent() {
        let registry = registry();
        let orders = registry.get_or_create("orders");
        let users = registry.get_or_create("users");
        assert!(!Arc::ptr_eq(&orders, &users));

        orders.next_id().unwrap();
        orders.next_id().unwrap();
        // Same instance, same millisecond: a fresh scope starts over and may
        // repeat values already issued by another scope.
        let first_user = users.next_id().unwrap();
        assert_eq!(first_user.sequence(), 0);

        let mut scopes = registry.scopes();
        scopes.sort();
        assert_eq!(scopes, ["orders", "users"]);
    }

    #[test]
    fn concurrent_first_use_creates_one_generator() {
        let registry = registry();
        let created = std::sync::Mutex::new(Vec::new());

        scope(|s| {
            for _ in 0..16 {
                s.spawn(|| {
                    let generator = registry.get_or_create("shared");
                    created.lock().unwrap().push(generator);
                });
            }
        });

        let created = created.into_inner().unwrap();
        assert_eq!(registry.len(), 1);
        assert!(created.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn concurrent_ids_within_a_scope_are_unique() {
        let registry = registry();
        let ids = std::sync::Mutex::new(std::collections::HashSet::new());

        scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..100 {
                        let crate::Poll::Ready { id } =
                            registry.get_or_create("x").poll_id().unwrap()
                        else {
                            panic!("sequence exhausted");
                        };
                        assert!(ids.lock().unwrap().insert(id));
                    }
                });
            }
        });

        assert_eq!(ids.into_inner().unwrap().len(), 800);
    }
}
