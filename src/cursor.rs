//! Cyclic pagination over search results

use crate::candidate::Candidate;

/// Cursor over an ordered candidate list.
///
/// The index is `Some` and in bounds whenever the list is non-empty, and `None`
/// when it is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCursor {
    candidates: Vec<Candidate>,
    index: Option<usize>,
}

impl ResultCursor {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        let index = if candidates.is_empty() { None } else { Some(0) };
        Self { candidates, index }
    }

    pub fn current(&self) -> Option<&Candidate> {
        self.index.and_then(|i| self.candidates.get(i))
    }

    /// Advance (wrapping) and return the new current candidate
    pub fn next(&mut self) -> Option<&Candidate> {
        let len = self.candidates.len();
        self.index = self.index.map(|i| (i + 1) % len);
        self.current()
    }

    #[allow(dead_code)] // Used in tests
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    #[allow(dead_code)] // Used in tests
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[allow(dead_code)] // Used in tests
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
