//! Loom compatibility shim.
//!
//! Under `cfg(loom)` the blocking primitives come from loom, so the
//! components run unchanged under its deterministic scheduler:
//!
//! ```bash
//! RUSTFLAGS="--cfg loom" cargo test --release loom
//! ```

#[cfg(loom)]
pub(crate) use loom::sync::{Condvar, Mutex as StateMutex, MutexGuard as StateGuard};

#[cfg(not(loom))]
pub(crate) use std::sync::{Condvar, Mutex as StateMutex, MutexGuard as StateGuard};
