//! Configuration access port trait.
//!
//! Lookups are by INI-style `section`/`key`. Numeric keys are parsed by the
//! caller from `get_string` so a malformed value can be reported.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
}
