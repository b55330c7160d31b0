//! Interior-mutability cell types for structures that are owned by exactly
//! one task at a time.
//!
//! These mirror the small zoo of cell types used throughout the capsules in
//! this workspace: [`OptionalCell`] for a `Copy` value that may or may not be
//! present, [`TakeCell`] for a borrowed buffer that is handed out and
//! returned, and [`MapCell`] for a non-`Copy` value that callers operate on
//! in place. None of them are `Sync`; state shared across more than one
//! concurrently-running task uses `std::sync::Mutex` instead (see
//! `kernel::sync`).

use core::cell::{Cell, RefCell};
use core::fmt;

/// A `Cell` holding an `Option<T>` for `Copy` types, with ergonomic
/// accessors for the "maybe present" pattern.
pub struct OptionalCell<T: Copy> {
    value: Cell<Option<T>>,
}

impl<T: Copy> OptionalCell<T> {
    pub const fn empty() -> OptionalCell<T> {
        OptionalCell {
            value: Cell::new(None),
        }
    }

    pub const fn new(value: T) -> OptionalCell<T> {
        OptionalCell {
            value: Cell::new(Some(value)),
        }
    }

    pub fn set(&self, value: T) {
        self.value.set(Some(value));
    }

    pub fn clear(&self) {
        self.value.set(None);
    }

    pub fn is_some(&self) -> bool {
        self.value.get().is_some()
    }

    pub fn is_none(&self) -> bool {
        self.value.get().is_none()
    }

    pub fn get(&self) -> Option<T> {
        self.value.get()
    }

    pub fn take(&self) -> Option<T> {
        self.value.take()
    }

    pub fn map<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(T) -> R,
    {
        self.value.get().map(f)
    }

    pub fn map_or<F, R>(&self, default: R, f: F) -> R
    where
        F: FnOnce(T) -> R,
    {
        self.value.get().map_or(default, f)
    }
}

impl<T: Copy> Default for OptionalCell<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// A cell that hands out a `&'static mut` buffer and takes it back, the way
/// a driver lends its scratch buffer to a peripheral transaction and
/// recovers it on completion.
pub struct TakeCell<'a, T: ?Sized> {
    value: Cell<Option<&'a mut T>>,
}

impl<'a, T: ?Sized> TakeCell<'a, T> {
    pub const fn empty() -> TakeCell<'a, T> {
        TakeCell {
            value: Cell::new(None),
        }
    }

    pub const fn new(value: &'a mut T) -> TakeCell<'a, T> {
        TakeCell {
            value: Cell::new(Some(value)),
        }
    }

    pub fn is_none(&self) -> bool {
        let value = self.value.take();
        let result = value.is_none();
        self.value.set(value);
        result
    }

    pub fn is_some(&self) -> bool {
        !self.is_none()
    }

    pub fn take(&self) -> Option<&'a mut T> {
        self.value.take()
    }

    /// Puts a (possibly absent) buffer back into the cell, overwriting
    /// whatever was there.
    pub fn put(&self, value: Option<&'a mut T>) {
        self.value.set(value);
    }

    /// Replaces the cell's contents, returning the value that was there.
    pub fn replace(&self, value: &'a mut T) -> Option<&'a mut T> {
        self.value.replace(Some(value))
    }

    pub fn map<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&'a mut T) -> R,
    {
        self.take().map(f)
    }

    pub fn map_or<F, R>(&self, default: R, f: F) -> R
    where
        F: FnOnce(&'a mut T) -> R,
    {
        self.take().map_or(default, f)
    }
}

/// A cell holding a non-`Copy` value that callers mutate in place via
/// [`MapCell::map`] rather than taking ownership of a reference.
pub struct MapCell<T> {
    value: RefCell<Option<T>>,
}

impl<T> MapCell<T> {
    pub const fn empty() -> MapCell<T> {
        MapCell {
            value: RefCell::new(None),
        }
    }

    pub const fn new(value: T) -> MapCell<T> {
        MapCell {
            value: RefCell::new(Some(value)),
        }
    }

    pub fn is_none(&self) -> bool {
        self.value.borrow().is_none()
    }

    pub fn is_some(&self) -> bool {
        self.value.borrow().is_some()
    }

    pub fn put(&self, value: T) {
        *self.value.borrow_mut() = Some(value);
    }

    pub fn replace(&self, value: T) -> Option<T> {
        self.value.borrow_mut().replace(value)
    }

    pub fn take(&self) -> Option<T> {
        self.value.borrow_mut().take()
    }

    pub fn map<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        self.value.borrow_mut().as_mut().map(f)
    }
}

impl<T: fmt::Debug> fmt::Debug for MapCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapCell").field("value", &self.value.borrow()).finish()
    }
}
