//! Offset-stable batch splicing.
//!
//! Edits are collected against the original buffer, checked for overlap, then
//! applied from the highest start offset down so a pending edit never sees a
//! shifted offset.

use std::ops::Range;

/// Errors from building or applying an [`EditSet`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Edit {new:?} overlaps pending edit {existing:?}")]
    Overlap {
        existing: Range<usize>,
        new: Range<usize>,
    },

    #[error("Edit range {0:?} is inverted")]
    Inverted(Range<usize>),

    #[error("Edit range {0:?} is out of bounds")]
    OutOfBounds(Range<usize>),
}

/// A buffer that supports replacing a range in place.
pub trait Splice {
    /// What a range is replaced with.
    type Replacement;

    /// Whether `index` is a valid edit boundary.
    fn is_boundary(&self, index: usize) -> bool;

    /// Replace `range` with `replacement`.
    fn splice_range(&mut self, range: Range<usize>, replacement: Self::Replacement);

    /// Concatenate two replacements, `first` ending where `second` begins.
    fn join(first: Self::Replacement, second: Self::Replacement) -> Self::Replacement;
}

impl Splice for String {
    type Replacement = String;

    fn is_boundary(&self, index: usize) -> bool {
        self.is_char_boundary(index)
    }

    fn splice_range(&mut self, range: Range<usize>, replacement: String) {
        self.replace_range(range, &replacement);
    }

    fn join(mut first: String, second: String) -> String {
        first.push_str(&second);
        first
    }
}

impl<T> Splice for Vec<T> {
    type Replacement = Vec<T>;

    fn is_boundary(&self, index: usize) -> bool {
        index <= self.len()
    }

    fn splice_range(&mut self, range: Range<usize>, replacement: Vec<T>) {
        self.splice(range, replacement);
    }

    fn join(mut first: Vec<T>, second: Vec<T>) -> Vec<T> {
        first.extend(second);
        first
    }
}

/// Replace `range` of the original buffer with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit<R> {
    pub range: Range<usize>,
    pub replacement: R,
}

impl<R> Edit<R> {
    pub fn new(range: Range<usize>, replacement: R) -> Self {
        Self { range, replacement }
    }

    fn overlaps(&self, other: &Range<usize>) -> bool {
        let a = &self.range;
        if a.is_empty() && other.is_empty() {
            return a.start == other.start;
        }
        a.start < other.end && other.start < a.end
    }
}

/// A batch of non-overlapping edits.
#[derive(Debug, Clone)]
pub struct EditSet<R> {
    edits: Vec<Edit<R>>,
}

impl<R> Default for EditSet<R> {
    fn default() -> Self {
        Self { edits: Vec::new() }
    }
}

impl<R> EditSet<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an edit, rejecting it if it overlaps one already queued.
    ///
    /// Two insertions at the same offset count as overlapping since their
    /// relative order would be ambiguous.
    pub fn push(&mut self, edit: Edit<R>) -> Result<(), EditError> {
        if edit.range.start > edit.range.end {
            return Err(EditError::Inverted(edit.range));
        }

        if let Some(existing) = self.edits.iter().find(|e| e.overlaps(&edit.range)) {
            return Err(EditError::Overlap {
                existing: existing.range.clone(),
                new: edit.range,
            });
        }

        self.edits.push(edit);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply every edit to `buffer` and return the number of splices made.
    ///
    /// Edits that touch end to start are merged into one splice. Nothing is
    /// modified if any range falls outside the buffer.
    pub fn apply<B>(self, buffer: &mut B) -> Result<usize, EditError>
    where
        B: Splice<Replacement = R>,
    {
        if let Some(bad) = self
            .edits
            .iter()
            .find(|e| !buffer.is_boundary(e.range.start) || !buffer.is_boundary(e.range.end))
        {
            return Err(EditError::OutOfBounds(bad.range.clone()));
        }

        let mut edits = self.edits;
        // Descending start; at equal starts the insertion goes last so it
        // lands in front of the replaced range.
        edits.sort_by(|a, b| {
            b.range
                .start
                .cmp(&a.range.start)
                .then(b.range.end.cmp(&a.range.end))
        });

        let mut splices = 0;
        let mut pending: Option<Edit<R>> = None;

        for edit in edits {
            pending = Some(match pending.take() {
                Some(later) if edit.range.end == later.range.start => Edit {
                    range: edit.range.start..later.range.end,
                    replacement: B::join(edit.replacement, later.replacement),
                },
                Some(later) => {
                    buffer.splice_range(later.range, later.replacement);
                    splices += 1;
                    edit
                }
                None => edit,
            });
        }

        if let Some(last) = pending {
            buffer.splice_range(last.range, last.replacement);
            splices += 1;
        }

        Ok(splices)
    }
}
