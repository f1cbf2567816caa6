//! Policy decision point adapters.

pub mod casbin;

pub use self::casbin::{CasbinPolicy, DEFAULT_MODEL, PolicyRule};
