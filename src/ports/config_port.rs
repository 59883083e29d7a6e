//! Configuration access port trait.
//!
//! Lookups are by `[section] key`. Typed getters fall back to `default` when
//! the key is absent or does not parse; validation in
//! [`crate::domain::config_validation`] rejects unparsable values up front.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    fn get_u64(&self, section: &str, key: &str, default: u64) -> u64 {
        self.get_string(section, key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }
}
