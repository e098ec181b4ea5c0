//! Classic semaphore-based synchronization: readers-writers and dining philosophers.

pub mod console;
pub mod driver;
pub mod sync;
