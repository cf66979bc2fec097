/// Outcome of an insert guarded by a uniqueness constraint.
///
/// Implementations use `ON CONFLICT DO NOTHING` (or equivalent) so that
/// concurrent duplicates resolve to `AlreadyExists` instead of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Row was inserted (first time seeing this key).
    Inserted,
    /// Row already existed; nothing was written.
    AlreadyExists,
}

impl SaveResult {
    pub fn is_inserted(&self) -> bool {
        matches!(self, SaveResult::Inserted)
    }
}
