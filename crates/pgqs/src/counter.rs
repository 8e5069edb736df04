//! Positional placeholder numbering.

/// Hands out `$1`, `$2`, … for one statement.
///
/// A counter is created for each top-level statement and lent mutably to
/// every nested fragment (subqueries included), so numbering stays
/// consecutive across the whole statement. Not `Clone`: two copies would
/// hand out the same number twice.
#[derive(Debug, Default)]
pub struct PositionalCounter {
    next: usize,
}

impl PositionalCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next position (1-based).
    pub fn next_position(&mut self) -> usize {
        self.next += 1;
        self.next
    }

    /// Claim the next position as placeholder text.
    pub fn next_placeholder(&mut self) -> String {
        format!("${}", self.next_position())
    }

    /// Number of positions claimed so far.
    pub fn claimed(&self) -> usize {
        self.next
    }
}
