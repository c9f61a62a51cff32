//! Configuration access port trait.

/// Numeric getters return `Ok(None)` when the key is absent or empty, and
/// `Err` with a description when the value does not parse.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, String>;
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, String>;
}
