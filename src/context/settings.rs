//! Request-scoped key/value state shared between middlewares.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Type-erased values keyed by name.
#[derive(Default)]
pub struct Settings {
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value`, replacing any previous value under `key`.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    /// Borrow the value under `key` if it exists and has type `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|value| value.downcast_ref::<T>())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("Settings").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_lookup() {
        let mut settings = Settings::new();
        settings.insert("user", "alice".to_string());
        settings.insert("attempts", 3u32);

        assert_eq!(settings.get::<String>("user").map(String::as_str), Some("alice"));
        assert_eq!(settings.get::<u32>("attempts"), Some(&3));
        // wrong type
        assert_eq!(settings.get::<u64>("attempts"), None);
        assert_eq!(settings.len(), 2);
    }

    #[test]
    fn test_overwrite_and_remove() {
        let mut settings = Settings::new();
        settings.insert("k", 1i32);
        settings.insert("k", 2i32);
        assert_eq!(settings.get::<i32>("k"), Some(&2));

        assert!(settings.remove("k"));
        assert!(!settings.remove("k"));
        assert!(settings.is_empty());
    }
}
