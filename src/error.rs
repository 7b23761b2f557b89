/// Errors that can occur when applying a [`Changeset`](crate::Changeset) to a
/// pair of snapshots it was not computed from.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    /// A removal or move source does not exist in the previous version.
    #[error("Removal offset {offset} is out of bounds for a previous version of length {len}")]
    RemovalOutOfBounds { offset: usize, len: usize },
    /// An insertion or move destination does not exist in the current version,
    /// or lies past the end of the partially rebuilt sequence.
    #[error("Insertion offset {offset} is out of bounds for a sequence of length {len}")]
    InsertOutOfBounds { offset: usize, len: usize },
    /// A mutation does not exist in the current version.
    #[error("Mutation offset {offset} is out of bounds for a current version of length {len}")]
    MutationOutOfBounds { offset: usize, len: usize },
    /// The rebuilt sequence does not have the length of the current version.
    #[error("Rebuilt sequence has length {actual}, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}
