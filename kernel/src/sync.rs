//! A named-mutex wrapper matching the OSAL's `SigMutexCreate`/
//! `SigSemCreate` idiom: every shared-state cell in this workspace (the
//! fault aggregator's 64-bit word, the task monitor's statistics table,
//! the RDF logger queue) is created once, by name, and is poisoning-proof
//! the way the RTOS abstraction layer's mutexes never "fail" once created
//! — a poisoned lock here indicates a capsule panicked while holding the
//! lock, treated here as itself a fault, not a normal control-flow path.

use std::sync::{Mutex, MutexGuard};

/// A named mutex. The name exists for diagnostics only (log lines,
/// `Debug` output) the way the OSAL's `pu8Name` argument does; it carries
/// no runtime behavior.
pub struct NamedMutex<T> {
    name: &'static str,
    inner: Mutex<T>,
}

impl<T> NamedMutex<T> {
    pub fn new(name: &'static str, value: T) -> NamedMutex<T> {
        NamedMutex {
            name,
            inner: Mutex::new(value),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Blocks until the lock is acquired. A poisoned lock is recovered
    /// rather than propagated: the holder having panicked does not make
    /// the protected state any less necessary to serialize.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                crate::debug_flt!("mutex '{}' was poisoned, recovering", self.name);
                poisoned.into_inner()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_mutex_serializes_access() {
        let m = NamedMutex::new("fault_word", 0u64);
        {
            let mut guard = m.lock();
            *guard |= 1;
        }
        assert_eq!(*m.lock(), 1);
        assert_eq!(m.name(), "fault_word");
    }
}
