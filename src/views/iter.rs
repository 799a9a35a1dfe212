//! Forward iteration over ordered containers

use crate::errors::PyResult;
use crate::object::Object;

/// Indexed container with a length fixed at the time of the call
pub trait Sequence {
    fn seq_len(&self) -> usize;
    fn seq_item(&self, index: usize) -> PyResult<Object>;
}

/// Walks `[0, len)` with `len` taken at construction.
///
/// No snapshot is taken: if the container shrinks underneath, iteration
/// stops at the first index that can no longer be read.
pub struct SeqIter<'a, S: Sequence + ?Sized> {
    seq: &'a S,
    index: usize,
    end: usize,
}

impl<'a, S: Sequence + ?Sized> SeqIter<'a, S> {
    pub fn new(seq: &'a S) -> Self {
        Self {
            seq,
            index: 0,
            end: seq.seq_len(),
        }
    }

    /// Back to the first element of the original range
    pub fn restart(&mut self) {
        self.index = 0;
    }

    pub fn position(&self) -> usize {
        self.index
    }
}

impl<S: Sequence + ?Sized> Iterator for SeqIter<'_, S> {
    type Item = Object;

    fn next(&mut self) -> Option<Object> {
        if self.index >= self.end {
            return None;
        }
        match self.seq.seq_item(self.index) {
            Ok(item) => {
                self.index += 1;
                Some(item)
            }
            Err(_) => {
                self.index = self.end;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.end.saturating_sub(self.index)))
    }
}
