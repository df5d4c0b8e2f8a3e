//! # Shared Contexts
//!
//! Thread-safe key-value stores shared between interceptors and handlers.
//!
//! - [`Context`] is the process-wide store owned by the `Application`.
//! - [`ScopedContext`] is owned by one `Router`. Lookups that miss the local
//!   store fall back to the linked global [`Context`]; writes always stay
//!   local.
//!
//! Every write takes the store's write lock, so concurrent request handling
//! sees one writer at a time.

use crate::error::{Error, Result};
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Store = HashMap<String, Box<dyn Any + Send + Sync>>;

/// Process-wide context
///
/// Stores arbitrary typed values under string keys. Cloning yields another
/// handle to the same store.
///
/// ```ignore
/// let ctx = Context::new();
/// ctx.set("greeting", "hello".to_string());
/// let greeting: String = ctx.get("greeting")?;
/// ```
#[derive(Clone, Default)]
pub struct Context {
    data: Arc<RwLock<Store>>,
}

impl Context {
    /// Create a new empty context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a value with a string key
    ///
    /// Overwrites any existing value with the same key.
    pub fn set<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        self.write().insert(key.into(), Box::new(value));
    }

    /// Get a cloned value by key
    ///
    /// # Errors
    ///
    /// `AttributeNotFound` if the key is absent, `AttributeTypeMismatch` if it
    /// holds a value of another type.
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Result<T> {
        let data = self.read();
        let boxed = data.get(key).ok_or_else(|| not_found(key))?;
        downcast(key, &**boxed)
    }

    /// Check if a key exists
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// Remove a value by key
    pub fn remove(&self, key: &str) -> bool {
        self.write().remove(key).is_some()
    }

    /// Get the number of stored items
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if context is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored keys, sorted
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Whether both handles point at the same store
    #[must_use]
    pub fn same_store(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("keys", &self.keys())
            .finish()
    }
}

/// Router-local context with read-only fallback to the global context
#[derive(Clone, Default)]
pub struct ScopedContext {
    local: Context,
    global: Option<Context>,
    prefix: String,
}

impl ScopedContext {
    /// Create an unlinked context for the router mounted at `prefix`
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            local: Context::new(),
            global: None,
            prefix: prefix.into(),
        }
    }

    /// Link to the global context used for lookup fallback
    pub fn relate(&mut self, global: Context) {
        self.global = Some(global);
    }

    /// Linked global context, if registered
    #[must_use]
    pub const fn global(&self) -> Option<&Context> {
        self.global.as_ref()
    }

    /// Router-local store
    #[must_use]
    pub const fn local(&self) -> &Context {
        &self.local
    }

    /// Prefix of the router owning this context
    #[must_use]
    pub fn router_prefix(&self) -> &str {
        &self.prefix
    }

    /// Store a value in the local store only
    pub fn set<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        self.local.set(key, value);
    }

    /// Look up locally, then in the global context
    ///
    /// A key present locally shadows the global one even if the requested
    /// type differs.
    ///
    /// # Errors
    ///
    /// `AttributeNotFound` if neither store holds the key,
    /// `AttributeTypeMismatch` if the resolved value has another type.
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Result<T> {
        if let Some(boxed) = self.local.read().get(key) {
            return downcast(key, &**boxed);
        }
        match &self.global {
            Some(global) => global.get(key),
            None => Err(not_found(key)),
        }
    }

    /// Check both stores for a key
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.local.contains(key) || self.global.as_ref().is_some_and(|g| g.contains(key))
    }
}

impl std::fmt::Debug for ScopedContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedContext")
            .field("prefix", &self.prefix)
            .field("local", &self.local)
            .field("linked", &self.global.is_some())
            .finish()
    }
}

fn not_found(key: &str) -> Error {
    Error::AttributeNotFound {
        name: key.to_string(),
    }
}

fn downcast<T: Clone + 'static>(key: &str, value: &(dyn Any + Send + Sync)) -> Result<T> {
    value
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| Error::AttributeTypeMismatch {
            name: key.to_string(),
            expected: type_name::<T>(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_set_get() {
        let ctx = Context::new();
        ctx.set("count", 42i32);
        ctx.set("name", "test".to_string());

        assert_eq!(ctx.get::<i32>("count").unwrap(), 42);
        assert_eq!(ctx.get::<String>("name").unwrap(), "test");
    }

    #[test]
    fn test_context_type_mismatch() {
        let ctx = Context::new();
        ctx.set("count", 42i32);

        assert!(matches!(
            ctx.get::<String>("count"),
            Err(Error::AttributeTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_context_missing_key() {
        let ctx = Context::new();
        assert!(matches!(
            ctx.get::<i32>("missing"),
            Err(Error::AttributeNotFound { .. })
        ));
    }

    #[test]
    fn test_context_overwrite_and_remove() {
        let ctx = Context::new();
        ctx.set("value", 1i32);
        ctx.set("value", 2i32);
        assert_eq!(ctx.get::<i32>("value").unwrap(), 2);

        assert!(ctx.remove("value"));
        assert!(!ctx.contains("value"));
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_context_clone_shares_store() {
        let ctx = Context::new();
        let other = ctx.clone();
        other.set("shared", true);
        assert!(ctx.get::<bool>("shared").unwrap());
        assert!(ctx.same_store(&other));
        assert!(!ctx.same_store(&Context::new()));
    }

    #[test]
    fn test_scoped_falls_back_to_global() {
        let global = Context::new();
        global.set("db", "sqlite".to_string());

        let mut scoped = ScopedContext::new("/python");
        assert!(scoped.get::<String>("db").is_err());

        scoped.relate(global.clone());
        assert_eq!(scoped.get::<String>("db").unwrap(), "sqlite");
        assert!(scoped.contains("db"));
    }

    #[test]
    fn test_scoped_write_stays_local() {
        let global = Context::new();
        global.set("db", "sqlite".to_string());

        let mut scoped = ScopedContext::new("/python");
        scoped.relate(global.clone());
        scoped.set("db", "postgres".to_string());

        assert_eq!(scoped.get::<String>("db").unwrap(), "postgres");
        assert_eq!(global.get::<String>("db").unwrap(), "sqlite");
    }

    #[test]
    fn test_local_key_shadows_global_type() {
        let global = Context::new();
        global.set("limit", 10u32);

        let mut scoped = ScopedContext::new("");
        scoped.relate(global);
        scoped.set("limit", "ten".to_string());

        assert!(matches!(
            scoped.get::<u32>("limit"),
            Err(Error::AttributeTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_scoped_falls_back_after_local_remove() {
        let global = Context::new();
        global.set("db", "sqlite".to_string());

        let mut scoped = ScopedContext::new("");
        scoped.relate(global);
        scoped.set("db", "postgres".to_string());
        assert_eq!(scoped.get::<String>("db").unwrap(), "postgres");

        assert!(scoped.local().remove("db"));
        assert_eq!(scoped.get::<String>("db").unwrap(), "sqlite");
    }

    #[test]
    fn test_router_prefix() {
        let scoped = ScopedContext::new("/python");
        assert_eq!(scoped.router_prefix(), "/python");
        assert!(scoped.global().is_none());
    }

    #[test]
    fn test_context_thread_safe() {
        use std::thread;

        let ctx = Context::new();
        let ctx_clone = ctx.clone();

        let handle = thread::spawn(move || {
            ctx_clone.set("thread", 123i32);
        });

        handle.join().unwrap();
        assert_eq!(ctx.get::<i32>("thread").unwrap(), 123);
    }
}
