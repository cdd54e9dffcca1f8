//! Utility modules for rork-trackid

pub mod store_retry;

pub use store_retry::retry_on_lock;
