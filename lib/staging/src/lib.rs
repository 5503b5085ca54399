//! Staging carts — transient line-item sets held in the KV store.
//!
//! A cart is the set of KV entries under `cart:{scope}:{cart_id}:`, one entry
//! per line keyed by a stable line key. Carts hold in-progress stock-in,
//! stock-out and point-of-sale lines until the owning module commits them to
//! SQL; the cart is cleared only after that commit succeeds.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};

use fixerp_core::ServiceError;
use fixerp_kv::{KVError, KVStore};

/// Trait implemented by cart line types.
pub trait CartLine: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Stable key of this line inside its cart (e.g. the component id).
    fn line_key(&self) -> &str;

    /// Fold a re-added line into this one (quantity aggregation).
    fn merge(&mut self, incoming: Self);
}

/// Typed cart operations for one scope ("stockin", "stockout", "pos").
/// Holds a reference to the KV backend.
pub struct StagingCart<T: CartLine> {
    kv: Arc<dyn KVStore>,
    scope: &'static str,
    _phantom: PhantomData<T>,
}

impl<T: CartLine> StagingCart<T> {
    pub fn new(kv: Arc<dyn KVStore>, scope: &'static str) -> Self {
        Self {
            kv,
            scope,
            _phantom: PhantomData,
        }
    }

    fn storage_key(&self, cart_id: &str, line_key: &str) -> String {
        format!("cart:{}:{}:{}", self.scope, cart_id, line_key)
    }

    fn cart_prefix(&self, cart_id: &str) -> String {
        format!("cart:{}:{}:", self.scope, cart_id)
    }

    fn kv_err(e: KVError) -> ServiceError {
        ServiceError::Storage(e.to_string())
    }

    fn encode(line: &T) -> Result<Vec<u8>, ServiceError> {
        serde_json::to_vec(line).map_err(|e| ServiceError::Internal(format!("serialize: {}", e)))
    }

    fn decode(bytes: &[u8]) -> Result<T, ServiceError> {
        serde_json::from_slice(bytes)
            .map_err(|e| ServiceError::Internal(format!("deserialize: {}", e)))
    }

    /// Ids become key segments, so a ':' would let one cart's lines leak
    /// into another cart's prefix scan.
    fn check_segment(kind: &str, value: &str) -> Result<(), ServiceError> {
        if value.is_empty() {
            return Err(ServiceError::Validation(format!("{} must not be empty", kind)));
        }
        if value.contains(':') {
            return Err(ServiceError::Validation(format!(
                "{} must not contain ':': '{}'",
                kind, value
            )));
        }
        Ok(())
    }

    /// Insert a line, folding it into an existing line with the same key.
    /// Returns the stored (possibly merged) line.
    pub fn upsert_line(&self, cart_id: &str, line: T) -> Result<T, ServiceError> {
        Self::check_segment("cart id", cart_id)?;
        Self::check_segment("line key", line.line_key())?;

        let key = self.storage_key(cart_id, line.line_key());
        let stored = match self.kv.get(&key).map_err(Self::kv_err)? {
            Some(bytes) => {
                let mut current = Self::decode(&bytes)?;
                current.merge(line);
                current
            }
            None => line,
        };
        self.kv.set(&key, &Self::encode(&stored)?).map_err(Self::kv_err)?;
        Ok(stored)
    }

    /// Replace a line without merging.
    pub fn set_line(&self, cart_id: &str, line: T) -> Result<(), ServiceError> {
        Self::check_segment("cart id", cart_id)?;
        Self::check_segment("line key", line.line_key())?;

        let key = self.storage_key(cart_id, line.line_key());
        self.kv.set(&key, &Self::encode(&line)?).map_err(Self::kv_err)
    }

    /// Get a line by key. Returns None if not present.
    pub fn get_line(&self, cart_id: &str, line_key: &str) -> Result<Option<T>, ServiceError> {
        let key = self.storage_key(cart_id, line_key);
        match self.kv.get(&key).map_err(Self::kv_err)? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Remove a line. Removing a line that isn't in the cart is NotFound.
    pub fn remove_line(&self, cart_id: &str, line_key: &str) -> Result<(), ServiceError> {
        let key = self.storage_key(cart_id, line_key);
        if self.kv.get(&key).map_err(Self::kv_err)?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "line '{}' not in cart '{}'",
                line_key, cart_id
            )));
        }
        self.kv.delete(&key).map_err(Self::kv_err)
    }

    /// All lines in the cart, line-key ascending.
    pub fn lines(&self, cart_id: &str) -> Result<Vec<T>, ServiceError> {
        let entries = self
            .kv
            .scan(&self.cart_prefix(cart_id))
            .map_err(Self::kv_err)?;
        let mut lines = Vec::with_capacity(entries.len());
        for (_key, bytes) in entries {
            lines.push(Self::decode(&bytes)?);
        }
        Ok(lines)
    }

    /// Number of lines in the cart.
    pub fn line_count(&self, cart_id: &str) -> Result<usize, ServiceError> {
        let entries = self
            .kv
            .scan(&self.cart_prefix(cart_id))
            .map_err(Self::kv_err)?;
        Ok(entries.len())
    }

    /// Drop the whole cart. Returns the number of lines removed.
    pub fn clear(&self, cart_id: &str) -> Result<usize, ServiceError> {
        self.kv
            .delete_prefix(&self.cart_prefix(cart_id))
            .map_err(Self::kv_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixerp_kv::RedbStore;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestLine {
        item_id: String,
        name: String,
        qty: i64,
    }

    impl TestLine {
        fn new(item_id: &str, name: &str, qty: i64) -> Self {
            Self {
                item_id: item_id.to_string(),
                name: name.to_string(),
                qty,
            }
        }
    }

    impl CartLine for TestLine {
        fn line_key(&self) -> &str {
            &self.item_id
        }

        fn merge(&mut self, incoming: Self) {
            self.qty += incoming.qty;
        }
    }

    fn open_cart(tmp: &TempDir, scope: &'static str) -> StagingCart<TestLine> {
        let kv = RedbStore::open(&tmp.path().join("carts.redb")).unwrap();
        StagingCart::new(Arc::new(kv), scope)
    }

    #[test]
    fn upsert_merges_quantities() {
        let tmp = TempDir::new().unwrap();
        let cart = open_cart(&tmp, "stockin");

        cart.upsert_line("c1", TestLine::new("scr-01", "screen", 2)).unwrap();
        let merged = cart.upsert_line("c1", TestLine::new("scr-01", "screen", 3)).unwrap();
        assert_eq!(merged.qty, 5);

        let lines = cart.lines("c1").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].qty, 5);
    }

    #[test]
    fn set_line_replaces_without_merging() {
        let tmp = TempDir::new().unwrap();
        let cart = open_cart(&tmp, "stockin");

        cart.upsert_line("c1", TestLine::new("scr-01", "screen", 2)).unwrap();
        cart.set_line("c1", TestLine::new("scr-01", "screen", 7)).unwrap();

        let line = cart.get_line("c1", "scr-01").unwrap().unwrap();
        assert_eq!(line.qty, 7);
    }

    #[test]
    fn remove_line_and_missing_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let cart = open_cart(&tmp, "pos");

        cart.upsert_line("till1", TestLine::new("case-01", "case", 1)).unwrap();
        cart.remove_line("till1", "case-01").unwrap();
        assert!(cart.get_line("till1", "case-01").unwrap().is_none());

        let err = cart.remove_line("till1", "case-01").unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn lines_are_sorted_and_carts_isolated() {
        let tmp = TempDir::new().unwrap();
        let cart = open_cart(&tmp, "pos");

        cart.upsert_line("till1", TestLine::new("b", "second", 1)).unwrap();
        cart.upsert_line("till1", TestLine::new("a", "first", 1)).unwrap();
        cart.upsert_line("till2", TestLine::new("c", "other cart", 1)).unwrap();

        let keys: Vec<String> = cart
            .lines("till1")
            .unwrap()
            .into_iter()
            .map(|l| l.item_id)
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(cart.line_count("till2").unwrap(), 1);
    }

    #[test]
    fn scopes_do_not_collide() {
        let tmp = TempDir::new().unwrap();
        let kv: Arc<dyn KVStore> =
            Arc::new(RedbStore::open(&tmp.path().join("carts.redb")).unwrap());
        let stockin: StagingCart<TestLine> = StagingCart::new(kv.clone(), "stockin");
        let stockout: StagingCart<TestLine> = StagingCart::new(kv, "stockout");

        stockin.upsert_line("c1", TestLine::new("scr-01", "screen", 2)).unwrap();
        assert_eq!(stockout.line_count("c1").unwrap(), 0);
    }

    #[test]
    fn clear_empties_only_that_cart() {
        let tmp = TempDir::new().unwrap();
        let cart = open_cart(&tmp, "stockout");

        cart.upsert_line("c1", TestLine::new("a", "x", 1)).unwrap();
        cart.upsert_line("c1", TestLine::new("b", "y", 1)).unwrap();
        cart.upsert_line("c2", TestLine::new("a", "x", 1)).unwrap();

        assert_eq!(cart.clear("c1").unwrap(), 2);
        assert_eq!(cart.line_count("c1").unwrap(), 0);
        assert_eq!(cart.line_count("c2").unwrap(), 1);
    }

    #[test]
    fn ids_with_separator_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let cart = open_cart(&tmp, "pos");

        let err = cart
            .upsert_line("till:1", TestLine::new("a", "x", 1))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = cart
            .upsert_line("till1", TestLine::new("a:b", "x", 1))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = cart.upsert_line("", TestLine::new("a", "x", 1)).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
