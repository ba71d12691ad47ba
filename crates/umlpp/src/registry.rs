//! Shared cache of parsed documents keyed by resolved URL.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use log::debug;
use tokio::sync::OnceCell;

use umlpp_parser::Root;

use crate::context::FileContext;

type Slot = Arc<OnceCell<Arc<FileContext>>>;

/// Process-wide cache of [`FileContext`]s, constructed explicitly and shared
/// by everything that resolves includes.
///
/// The map lock is only held to find or create a key's slot. Loading happens
/// outside it, and concurrent loads of one key await the same slot.
#[derive(Default)]
pub struct ContextRegistry {
    slots: Mutex<HashMap<String, Slot>>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, key: &str) -> Slot {
        Arc::clone(self.slots().entry(key.to_string()).or_default())
    }

    /// The loaded context for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Arc<FileContext>> {
        let slot = self.slots().get(key).cloned()?;
        slot.get().cloned()
    }

    /// Store `root` as the content of `key`.
    ///
    /// A load of `key` already in flight is awaited first. When a context ends
    /// up stored, whether loaded or inserted earlier, its content is replaced
    /// with `root`; otherwise a new context is stored. Returns the stored
    /// context.
    pub async fn upsert(&self, key: &str, root: Root) -> Arc<FileContext> {
        let fresh = Arc::new(FileContext::new(Some(key.to_string()), root));
        loop {
            let slot = self.slot(key);
            let stored = Arc::clone(slot.get_or_init(|| async { Arc::clone(&fresh) }).await);
            // A failed load may have dropped the slot while this call waited.
            if !self.holds(key, &slot) {
                debug!(key; "Slot replaced while waiting, retrying");
                continue;
            }
            if !Arc::ptr_eq(&stored, &fresh) {
                stored.swap_root(fresh.root());
            }
            return stored;
        }
    }

    fn holds(&self, key: &str, slot: &Slot) -> bool {
        self.slots()
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    /// The context for `key`, running `load` if nothing is stored yet.
    ///
    /// Concurrent callers for the same key share a single `load`. A failed
    /// load leaves no entry behind.
    ///
    /// # Errors
    ///
    /// Returns the error of `load`.
    pub async fn get_or_load<F, Fut, E>(&self, key: &str, load: F) -> Result<Arc<FileContext>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<FileContext>, E>>,
    {
        let slot = self.slot(key);
        if let Some(context) = slot.get() {
            debug!(key; "Registry hit");
            return Ok(Arc::clone(context));
        }

        debug!(key; "Registry miss");
        match slot.get_or_try_init(load).await {
            Ok(context) => Ok(Arc::clone(context)),
            Err(err) => {
                self.remove_empty(key, &slot);
                Err(err)
            }
        }
    }

    fn remove_empty(&self, key: &str, slot: &Slot) {
        let mut slots = self.slots();
        let stale = slots
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && !current.initialized());
        if stale {
            slots.remove(key);
        }
    }

    /// Whether a loaded context is stored for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of loaded contexts.
    pub fn len(&self) -> usize {
        self.slots().values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use umlpp_parser::Statement;

    use super::*;
    use crate::context::SourceDocument;

    fn context(key: &str, text: &str) -> Arc<FileContext> {
        Arc::new(SourceDocument::new(Some(key.to_string()), text).parse().unwrap())
    }

    fn root(text: &str) -> Root {
        umlpp_parser::parse(text).unwrap()
    }

    fn first_name(context: &FileContext) -> String {
        match &context.root().statements()[0] {
            Statement::VariableDeclaration(declaration) => declaration.name.name.clone(),
            other => panic!("expected a declaration, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_stored_content() {
        let registry = ContextRegistry::new();
        let first = registry.upsert("mem:a", root("!$a = 1\n")).await;
        let second = registry.upsert("mem:a", root("!$b = 2\n")).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first_name(&second), "$b");
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("mem:a"));
        assert!(!registry.contains("mem:b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_upsert_during_load_keeps_live_content() {
        let registry = ContextRegistry::new();
        let load = || async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, String>(context("mem:a", "!$disk = 1\n"))
        };
        let edit = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            registry.upsert("mem:a", root("!$live = 1\n")).await
        };

        let (loaded, edited) = tokio::join!(registry.get_or_load("mem:a", load), edit);
        assert!(Arc::ptr_eq(&loaded.unwrap(), &edited));

        let stored = registry.get("mem:a").unwrap();
        assert!(Arc::ptr_eq(&stored, &edited));
        assert_eq!(first_name(&stored), "$live");
    }

    #[tokio::test(start_paused = true)]
    async fn test_upsert_after_failed_load_is_stored() {
        let registry = ContextRegistry::new();
        let load = || async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err::<Arc<FileContext>, _>("offline")
        };
        let edit = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            registry.upsert("mem:a", root("!$live = 1\n")).await
        };

        let (loaded, edited) = tokio::join!(registry.get_or_load("mem:a", load), edit);
        assert!(loaded.is_err());
        let stored = registry.get("mem:a").unwrap();
        assert!(Arc::ptr_eq(&stored, &edited));
        assert_eq!(first_name(&stored), "$live");
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_loads_share_one_call() {
        let registry = ContextRegistry::new();
        let loads = AtomicUsize::new(0);
        let counter = &loads;
        let load = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, String>(context("mem:a", "!$a = 1\n"))
        };

        let (first, second) = tokio::join!(
            registry.get_or_load("mem:a", load),
            registry.get_or_load("mem:a", load)
        );
        assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_leaves_no_entry() {
        let registry = ContextRegistry::new();
        let result = registry
            .get_or_load("mem:bad", || async { Err::<Arc<FileContext>, _>("boom") })
            .await;

        assert_eq!(result.err(), Some("boom"));
        assert!(registry.is_empty());
        assert!(registry.slots().is_empty());

        let loaded = registry
            .get_or_load("mem:bad", || async { Ok::<_, &str>(context("mem:bad", "ok\n")) })
            .await;
        assert!(loaded.is_ok());
        assert!(registry.contains("mem:bad"));
    }
}
