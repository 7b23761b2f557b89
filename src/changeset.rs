use std::{
    collections::HashSet,
    fmt::{self, Display, Formatter},
    hash::Hash,
};

use crate::{
    diff,
    error::ApplyError,
    offset_set::OffsetSet,
    strategy::{ByKey, ByValue, DiffStrategy, Strategy},
};

/// A move of one element from an offset in the previous version to an offset
/// in the current version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub source: usize,
    pub destination: usize,
    /// Whether the element also changed content.
    pub is_mutated: bool,
}

impl Move {
    pub fn new(source: usize, destination: usize, is_mutated: bool) -> Self {
        Move {
            source,
            destination,
            is_mutated,
        }
    }
}

/// An atomic batch of changes between two versions of an ordered collection.
///
/// All positions are zero-based offsets.  Removal offsets and move sources
/// index the previous version; insertion offsets and move destinations index
/// the current version.  A move is equivalent to a removal at its source plus
/// an insertion at its destination, so the current version can be rebuilt from
/// the previous one:
///
/// 1. Remove every offset in `removals` and every move source.
/// 2. Insert, in ascending order, the current element at every offset in
///    `inserts` and every move destination.
/// 3. Overwrite every offset in `mutations` with the current element.
///
/// [`Changeset::apply`] performs these steps.
///
/// Moves that are implied by an adjacent block of removals or insertions are
/// left out, so an element whose offset shifted only because of such a block is
/// not reported at all.
#[derive(Clone, Debug, Default)]
pub struct Changeset {
    /// Offsets in the current version with no counterpart in the previous one.
    pub inserts: OffsetSet,
    /// Offsets in the previous version with no counterpart in the current one.
    pub removals: OffsetSet,
    /// Offsets, valid in both versions, of elements that stayed in place but
    /// changed content.  Elements that both moved and changed are reported in
    /// `moves` instead.
    pub mutations: OffsetSet,
    pub moves: Vec<Move>,
}

impl Changeset {
    /// The changeset of a collection with no previous version: every element
    /// is an insertion.
    pub fn initial(len: usize) -> Self {
        Changeset {
            inserts: OffsetSet::from_range(0..len),
            ..Changeset::default()
        }
    }

    /// Computes the changes that turn `previous` into `current`.
    ///
    /// Elements are matched by the identifiers `strategy` assigns to them;
    /// matched elements that `strategy` reports as unequal become mutations or
    /// mutated moves.  When several elements share an identifier, they are
    /// paired at best effort by proximity and the surplus is reported as
    /// insertions or removals.
    ///
    /// This never fails: any two sequences, including empty ones and ones
    /// with duplicate or disjoint identifiers, produce a changeset.
    pub fn new<T, S>(previous: Option<&[T]>, current: &[T], strategy: &S) -> Self
    where
        S: DiffStrategy<T>,
    {
        match previous {
            None => Changeset::initial(current.len()),
            Some(previous) => diff::compute(previous, current, strategy),
        }
    }

    /// Computes the changes between two versions, identifying and comparing
    /// elements by value.
    pub fn by_value<T: Hash + Eq>(previous: Option<&[T]>, current: &[T]) -> Self {
        Changeset::new(previous, current, &ByValue)
    }

    /// Computes the changes between two versions, identifying elements by the
    /// key `key` extracts and comparing them by value.
    pub fn by_key<T, K, F>(previous: Option<&[T]>, current: &[T], key: F) -> Self
    where
        T: PartialEq,
        K: Hash + Eq,
        F: Fn(&T) -> K,
    {
        Changeset::new(previous, current, &ByKey(key))
    }

    /// Computes the changes between two versions with an identifier function
    /// and an equality predicate.
    pub fn with<T, K, I, E>(previous: Option<&[T]>, current: &[T], identify: I, equals: E) -> Self
    where
        K: Hash + Eq,
        I: Fn(&T) -> K,
        E: Fn(&T, &T) -> bool,
    {
        Changeset::new(previous, current, &Strategy::new(identify, equals))
    }

    /// Returns `true` if the two versions are indistinguishable.
    pub fn has_no_changes(&self) -> bool {
        self.inserts.is_empty()
            && self.removals.is_empty()
            && self.mutations.is_empty()
            && self.moves.is_empty()
    }

    /// Removal offsets together with move sources.
    pub fn all_removals(&self) -> OffsetSet {
        let mut removals = self.removals.clone();
        removals.extend(self.moves.iter().map(|mv| mv.source));
        removals
    }

    /// Insertion offsets together with move destinations.
    pub fn all_inserts(&self) -> OffsetSet {
        let mut inserts = self.inserts.clone();
        inserts.extend(self.moves.iter().map(|mv| mv.destination));
        inserts
    }

    /// Rebuilds the current version from `previous` using the elements of
    /// `current` for every insertion, move and mutation.
    pub fn apply<T: Clone>(&self, previous: &[T], current: &[T]) -> Result<Vec<T>, ApplyError> {
        let removals = self.all_removals();
        let inserts = self.all_inserts();

        if let Some(offset) = removals.last().filter(|&offset| offset >= previous.len()) {
            return Err(ApplyError::RemovalOutOfBounds {
                offset,
                len: previous.len(),
            });
        }
        if let Some(offset) = inserts.last().filter(|&offset| offset >= current.len()) {
            return Err(ApplyError::InsertOutOfBounds {
                offset,
                len: current.len(),
            });
        }
        if let Some(offset) = self.mutations.last().filter(|&offset| offset >= current.len()) {
            return Err(ApplyError::MutationOutOfBounds {
                offset,
                len: current.len(),
            });
        }

        let mut elements: Vec<T> = previous
            .iter()
            .enumerate()
            .filter(|(offset, _)| !removals.contains(*offset))
            .map(|(_, element)| element.clone())
            .collect();

        for range in inserts.ranges() {
            if range.start > elements.len() {
                return Err(ApplyError::InsertOutOfBounds {
                    offset: range.start,
                    len: elements.len(),
                });
            }
            let tail = elements.split_off(range.start);
            elements.extend(current[range].iter().cloned());
            elements.extend(tail);
        }

        if elements.len() != current.len() {
            return Err(ApplyError::LengthMismatch {
                expected: current.len(),
                actual: elements.len(),
            });
        }

        for offset in self.mutations.iter() {
            elements[offset] = current[offset].clone();
        }
        Ok(elements)
    }
}

impl PartialEq for Changeset {
    fn eq(&self, other: &Self) -> bool {
        self.inserts == other.inserts
            && self.removals == other.removals
            && self.mutations == other.mutations
            && self.moves.len() == other.moves.len()
            && self.moves.iter().collect::<HashSet<_>>() == other.moves.iter().collect::<HashSet<_>>()
    }
}

impl Eq for Changeset {}

fn join<D: Display>(items: impl Iterator<Item = D>) -> String {
    items
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Display for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let marker = if self.is_mutated { "*" } else { "" };
        write!(f, "{} -> {}{}", self.source, marker, self.destination)
    }
}

impl Display for Changeset {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "- inserted {} item(s) at [{}]",
            self.inserts.len(),
            join(self.inserts.iter())
        )?;
        writeln!(
            f,
            "- deleted {} item(s) at [{}]",
            self.removals.len(),
            join(self.removals.iter())
        )?;
        writeln!(
            f,
            "- mutated {} item(s) at [{}]",
            self.mutations.len(),
            join(self.mutations.iter())
        )?;
        write!(
            f,
            "- moved {} item(s) at [{}]",
            self.moves.len(),
            join(self.moves.iter())
        )
    }
}
