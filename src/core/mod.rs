pub mod annotation;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod format;
pub mod ids;
pub mod loader;
pub mod locator;
pub mod query;
pub mod timeline;
