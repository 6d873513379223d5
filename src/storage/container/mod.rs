//! Array container implementations.

mod file;
mod memory;

pub use file::{FileContainer, HEADER_SIZE, MAGIC};
pub use memory::MemoryContainer;

use std::sync::{Mutex, MutexGuard};

/// Acquires a mutex lock, recovering from poisoning.
pub(crate) fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Container mutex was poisoned, recovering");
            metrics::counter!("container_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}
