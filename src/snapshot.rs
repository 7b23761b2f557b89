use std::fmt::Debug;

use derivative::Derivative;

use crate::{changeset::Changeset, strategy::DiffStrategy};

/// One version of a collection, paired with the changes from the version
/// before it.
///
/// The first snapshot of a collection has no previous version and its
/// changeset inserts every element.  Consumers that treat the first snapshot
/// as a complete replacement can check [`Snapshot::is_initial`].
#[derive(Derivative)]
#[derivative(
    Clone(bound = "C: Clone"),
    Debug(bound = "C: Debug")
)]
pub struct Snapshot<C> {
    pub previous: Option<C>,
    pub current: C,
    /// The changes which, applied to `previous`, reproduce `current`.
    pub changeset: Changeset,
}

impl<C> Snapshot<C> {
    pub fn new(previous: Option<C>, current: C, changeset: Changeset) -> Self {
        Snapshot {
            previous,
            current,
            changeset,
        }
    }

    /// The snapshot of a collection with no previous version.
    pub fn initial<T>(current: C) -> Self
    where
        C: AsRef<[T]>,
    {
        let changeset = Changeset::initial(current.as_ref().len());
        Snapshot::new(None, current, changeset)
    }

    pub fn is_initial(&self) -> bool {
        self.previous.is_none()
    }

    /// Diffs `current` against `previous` and bundles the result.
    pub fn diff<T, S>(previous: Option<C>, current: C, strategy: &S) -> Self
    where
        C: AsRef<[T]>,
        S: DiffStrategy<T>,
    {
        let changeset = Changeset::new(
            previous.as_ref().map(|previous| previous.as_ref()),
            current.as_ref(),
            strategy,
        );
        Snapshot::new(previous, current, changeset)
    }

    /// Diffs `current` against the current version of `self`, producing the
    /// snapshot that follows it.
    pub fn advance<T, S>(self, current: C, strategy: &S) -> Self
    where
        C: AsRef<[T]>,
        S: DiffStrategy<T>,
    {
        Snapshot::diff(Some(self.current), current, strategy)
    }
}

impl<C: PartialEq> PartialEq for Snapshot<C> {
    fn eq(&self, other: &Self) -> bool {
        self.changeset == other.changeset
            && self.previous == other.previous
            && self.current == other.current
    }
}
