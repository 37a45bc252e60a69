//! Configuration access port.
//!
//! Typed getters over `[section] key` pairs. Numeric getters fall back to the
//! given default when the key is missing or unparseable.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
}
