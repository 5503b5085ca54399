use crate::error::KVError;

/// KVStore provides the key-value storage interface for transient data.
///
/// Keys follow a namespaced convention: `cart:stockin:{cart}:{line}`,
/// `cart:pos:{till}:{line}`, etc. Related entries share a prefix so a whole
/// namespace can be scanned or dropped in one call.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. Deleting a missing key is a no-op.
    fn delete(&self, key: &str) -> Result<(), KVError>;

    /// Set multiple key-value pairs in a single write transaction.
    fn batch_set(&self, entries: &[(&str, &[u8])]) -> Result<(), KVError>;

    /// Delete multiple keys in a single write transaction.
    fn batch_delete(&self, keys: &[&str]) -> Result<(), KVError>;

    /// Scan all keys matching a prefix. Returns key-ascending (key, value) pairs.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;

    /// Delete every key matching a prefix in one write transaction.
    /// Returns the number of keys removed.
    fn delete_prefix(&self, prefix: &str) -> Result<usize, KVError>;
}
