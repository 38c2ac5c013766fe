//! Ordered, append-only storage for implementation candidates.

/// Owns every registered candidate and remembers which one is active.
///
/// Candidates are never removed, so an active index stays valid for the registry's lifetime.
pub struct ImplementationRegistry<I: ?Sized> {
    candidates: Vec<Box<I>>,
    active: Option<usize>,
    initialized: bool,
}

impl<I: ?Sized> ImplementationRegistry<I> {
    pub fn new() -> Self {
        ImplementationRegistry {
            candidates: Vec::new(),
            active: None,
            initialized: false,
        }
    }

    /// Appends a candidate and returns its position.
    pub fn register(&mut self, implementation: Box<I>) -> usize {
        self.candidates.push(implementation);
        self.candidates.len() - 1
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidates in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &I> + '_ {
        self.candidates.iter().map(|candidate| candidate.as_ref())
    }

    /// Position of the first candidate matching `predicate`.
    pub fn position<F>(&self, mut predicate: F) -> Option<usize>
    where
        F: FnMut(&I) -> bool,
    {
        self.candidates
            .iter()
            .position(|candidate| predicate(candidate.as_ref()))
    }

    /// Marks the candidate at `index` as active and returns it.
    ///
    /// Switching to a different candidate clears the initialized flag. An out-of-range index
    /// returns `None` and leaves the registry untouched.
    pub fn set_active(&mut self, index: usize) -> Option<&I> {
        if index >= self.candidates.len() {
            return None;
        }
        if self.active != Some(index) {
            self.initialized = false;
        }
        self.active = Some(index);
        Some(self.candidates[index].as_ref())
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&I> {
        self.active.map(|index| self.candidates[index].as_ref())
    }

    pub fn active_mut(&mut self) -> Option<&mut I> {
        self.active.map(|index| self.candidates[index].as_mut())
    }

    /// Whether the active candidate has completed `init`.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn mark_initialized(&mut self) {
        self.initialized = true;
    }
}

impl<I: ?Sized> Default for ImplementationRegistry<I> {
    fn default() -> Self {
        Self::new()
    }
}
