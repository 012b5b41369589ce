//! Circular dependency detection infrastructure.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};
use crate::key::Key;

pub(crate) const DEFAULT_MAX_DEPTH: usize = 1024;

/// Ordered path of keys currently being built by one resolution call tree.
///
/// The path is passed explicitly through every nested resolution rather
/// than stored in thread-local state, so unrelated concurrent resolutions
/// never observe each other's entries.
///
/// # Examples
///
/// ```
/// use scopewire::{ResolutionStack, key_of_type};
///
/// struct A;
/// struct B;
///
/// let mut stack = ResolutionStack::new();
/// stack.enter(&key_of_type::<A>()).unwrap();
/// stack.enter(&key_of_type::<B>()).unwrap();
/// let err = stack.enter(&key_of_type::<A>()).unwrap_err();
/// assert_eq!(err.chain().unwrap().len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ResolutionStack {
    keys: Vec<Key>,
    max_depth: usize,
}

impl Default for ResolutionStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionStack {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { keys: Vec::new(), max_depth }
    }

    /// Pushes `key`, failing if it is already on the path.
    ///
    /// The reported chain runs from the first occurrence of `key` to the
    /// current tail, followed by `key` again.
    pub fn enter(&mut self, key: &Key) -> DiResult<()> {
        // Circular detection BEFORE pushing the new key
        if let Some(start) = self.keys.iter().position(|k| k == key) {
            let chain = self.keys[start..]
                .iter()
                .chain(std::iter::once(key))
                .map(Key::display_name)
                .collect();
            return Err(DiError::circular(chain));
        }

        // Depth guard
        if self.keys.len() >= self.max_depth {
            return Err(DiError::unresolvable(
                key.display_name(),
                format!("maximum resolution depth {} exceeded", self.max_depth),
            ));
        }

        self.keys.push(*key);
        Ok(())
    }

    /// Removes the most recently entered occurrence of `key`.
    pub fn leave(&mut self, key: &Key) {
        if let Some(pos) = self.keys.iter().rposition(|k| k == key) {
            debug_assert_eq!(pos, self.keys.len() - 1, "resolution stack left out of order");
            self.keys.remove(pos);
        }
    }

    pub fn depth(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.keys.contains(key)
    }

    /// Keys on the path, outermost first.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

/// Guard for one entry on a shared resolution stack.
///
/// Dropping the guard leaves the key, so every exit path of a resolution
/// (success, error or panic) unwinds the stack.
pub(crate) struct StackGuard<'s> {
    stack: &'s RefCell<ResolutionStack>,
    key: Key,
}

impl<'s> StackGuard<'s> {
    pub(crate) fn enter(stack: &'s RefCell<ResolutionStack>, key: &Key) -> DiResult<Self> {
        stack.borrow_mut().enter(key)?;
        Ok(Self { stack, key: *key })
    }
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        // try_borrow_mut: never double-panic while unwinding
        if let Ok(mut stack) = self.stack.try_borrow_mut() {
            stack.leave(&self.key);
        }
    }
}
