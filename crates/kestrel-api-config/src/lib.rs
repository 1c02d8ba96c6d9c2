#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Runtime configuration for the Kestrel API subsystem.
//!
//! Layout: `store.rs` (the `PropertyStore` abstraction and its in-memory and
//! JSON-file backends), `options.rs` (`ApiOptions`, the flag and key holder
//! that writes through an attached store), `error.rs` (error types) and
//! `defaults.rs` (property key names and built-in defaults).

mod defaults;
pub mod error;
pub mod options;
pub mod store;

pub use error::{ConfigError, ConfigResult};
pub use options::ApiOptions;
pub use store::{JsonFileStore, MemoryStore, PropertyStore, SharedStore, StoreError};
