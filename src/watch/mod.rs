// src/watch/mod.rs

//! File watching and change dispatch.
//!
//! This module is responsible for:
//! - Compiling watch/exclude glob patterns into per-binding matchers.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//!
//! It does **not** know about task dependencies; it only turns filesystem
//! changes into binding-level hits for the debouncer.

pub mod patterns;
pub mod watcher;

pub use patterns::{
    build_bindings, default_binding_specs, RawBindingSpec, ReloadKind, WatchBinding,
};
pub use watcher::{spawn_watcher, WatcherHandle};
