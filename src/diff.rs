//! The matching passes behind [`Changeset::new`](crate::Changeset::new).
//!
//! Elements are matched across the two snapshots in the manner of Heckel's
//! algorithm: a table of buckets keyed by identifier records how often each
//! identifier occurs in the current snapshot and where it occurs in the
//! previous one.  Each offset of either snapshot then holds a [`Reference`],
//! which starts out pointing at its bucket and is resolved to an offset in the
//! other snapshot once a pairing is made.  Anything left unresolved at the end
//! is an insertion or a removal.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use bitvec::vec::BitVec;

use crate::{
    changeset::{Changeset, Move},
    offset_set::OffsetSet,
    strategy::DiffStrategy,
    tracing_support::info_span,
};

#[derive(Debug, Default)]
struct Bucket {
    /// Offsets in the current snapshot with this identifier that are still
    /// unpaired.
    unmatched_current: usize,
    /// Offsets in the previous snapshot with this identifier that are still
    /// unpaired.
    previous: BTreeSet<usize>,
}

impl Bucket {
    /// The unpaired previous offset nearest to `offset`, preferring the lower
    /// one on a tie.
    fn closest(&self, offset: usize) -> Option<usize> {
        let below = self.previous.range(..=offset).next_back().copied();
        let above = self.previous.range(offset..).next().copied();
        match (below, above) {
            (Some(below), Some(above)) => {
                if offset - below <= above - offset {
                    Some(below)
                } else {
                    Some(above)
                }
            }
            (below, above) => below.or(above),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Reference {
    /// Not yet paired; holds the index of the element's bucket.
    Unresolved(usize),
    /// Paired with the element at this offset of the other snapshot.
    Resolved(usize),
}

/// Working state of one diff computation.
struct Matching {
    buckets: Vec<Bucket>,
    previous: Vec<Reference>,
    current: Vec<Reference>,
}

fn bucket_index<K: Hash + Eq>(
    table: &mut HashMap<K, usize>,
    buckets: &mut Vec<Bucket>,
    id: K,
) -> usize {
    *table.entry(id).or_insert_with(|| {
        buckets.push(Bucket::default());
        buckets.len() - 1
    })
}

impl Matching {
    fn index<'a, T, S>(previous: &'a [T], current: &'a [T], strategy: &S) -> Self
    where
        S: DiffStrategy<T>,
    {
        let _span = info_span!("changeset_index").entered();
        let mut table: HashMap<S::Id<'a>, usize> = HashMap::with_capacity(current.len());
        let mut buckets = Vec::with_capacity(current.len());

        let current = current
            .iter()
            .map(|element| {
                let index = bucket_index(&mut table, &mut buckets, strategy.identify(element));
                buckets[index].unmatched_current += 1;
                Reference::Unresolved(index)
            })
            .collect();

        let previous = previous
            .iter()
            .enumerate()
            .map(|(offset, element)| {
                let index = bucket_index(&mut table, &mut buckets, strategy.identify(element));
                buckets[index].previous.insert(offset);
                Reference::Unresolved(index)
            })
            .collect();

        Matching {
            buckets,
            previous,
            current,
        }
    }

    /// Links `old` and `new` in both directions and takes them out of their
    /// bucket.  Both must be unresolved and share a bucket.
    fn pair(&mut self, old: usize, new: usize) {
        let Reference::Unresolved(index) = self.current[new] else {
            unreachable!("current offset {new} is already paired");
        };
        debug_assert_eq!(self.previous[old], Reference::Unresolved(index));
        let bucket = &mut self.buckets[index];
        bucket.previous.remove(&old);
        bucket.unmatched_current -= 1;
        self.previous[old] = Reference::Resolved(new);
        self.current[new] = Reference::Resolved(old);
    }

    /// Returns the shared bucket of `old` and `new` if both are unpaired and
    /// have the same identifier.
    fn shared_bucket(&self, old: usize, new: usize) -> Option<usize> {
        match (self.previous.get(old)?, self.current.get(new)?) {
            (Reference::Unresolved(a), Reference::Unresolved(b)) if a == b => Some(*a),
            _ => None,
        }
    }

    /// Pairs identifiers occurring exactly once in each snapshot.
    fn pair_unique(&mut self) {
        let _span = info_span!("changeset_unique_pairs").entered();
        for new in 0..self.current.len() {
            let Reference::Unresolved(index) = self.current[new] else {
                continue;
            };
            let bucket = &self.buckets[index];
            if bucket.unmatched_current == 1 && bucket.previous.len() == 1 {
                if let Some(&old) = bucket.previous.first() {
                    self.pair(old, new);
                }
            }
        }
    }

    /// Extends every pairing to the following offsets of both snapshots for as
    /// long as they carry the same identifier.
    fn consolidate_forward(&mut self) {
        let _span = info_span!("changeset_adjacency", direction = "forward").entered();
        for new in 0..self.current.len().saturating_sub(1) {
            let Reference::Resolved(old) = self.current[new] else {
                continue;
            };
            if self.shared_bucket(old + 1, new + 1).is_some() {
                self.pair(old + 1, new + 1);
            }
        }
    }

    /// Extends every pairing to the preceding offsets of both snapshots for as
    /// long as they carry the same identifier.
    fn consolidate_backward(&mut self) {
        let _span = info_span!("changeset_adjacency", direction = "backward").entered();
        for new in (1..self.current.len()).rev() {
            let Reference::Resolved(old) = self.current[new] else {
                continue;
            };
            if old > 0 && self.shared_bucket(old - 1, new - 1).is_some() {
                self.pair(old - 1, new - 1);
            }
        }
    }

    /// Pairs each remaining current offset with the nearest unpaired previous
    /// offset of the same identifier.  Current offsets whose bucket has run dry
    /// stay unresolved and become insertions.
    fn pair_closest(&mut self) {
        let _span = info_span!("changeset_closest_pairs").entered();
        for new in 0..self.current.len() {
            let Reference::Unresolved(index) = self.current[new] else {
                continue;
            };
            if let Some(old) = self.buckets[index].closest(new) {
                self.pair(old, new);
            }
        }
    }

    fn unresolved(references: &[Reference]) -> OffsetSet {
        references
            .iter()
            .enumerate()
            .filter(|(_, reference)| matches!(reference, Reference::Unresolved(_)))
            .map(|(offset, _)| offset)
            .collect()
    }

    /// Verifies that every pairing is linked in both directions, so each
    /// offset of either snapshot is classified exactly once.
    #[cfg(all(debug_assertions, not(feature = "unchecked")))]
    fn check_links(&self) {
        for (new, reference) in self.current.iter().enumerate() {
            if let Reference::Resolved(old) = *reference {
                assert_eq!(self.previous[old], Reference::Resolved(new));
            }
        }
        for (old, reference) in self.previous.iter().enumerate() {
            if let Reference::Resolved(new) = *reference {
                assert_eq!(self.current[new], Reference::Resolved(old));
            }
        }
    }
}

/// Candidate moves in destination order, indexed by destination.
struct MoveTable {
    moves: Vec<Move>,
    by_destination: Vec<Option<usize>>,
}

impl MoveTable {
    fn get(&self, source: usize, destination: usize) -> Option<usize> {
        let index = (*self.by_destination.get(destination)?)?;
        (self.moves[index].source == source).then_some(index)
    }

    /// Drops the unmutated moves made redundant by contiguous removal and
    /// insertion blocks.
    ///
    /// A removal block `lo..hi` shifts the elements that follow it back by its
    /// length, so moves `hi + k -> lo + k` are implied by the removals.  An
    /// insertion block shifts the elements at its position forward, implying
    /// moves `lo + k -> hi + k`.  Only the chain immediately adjacent to each
    /// block is considered.  Mutated moves keep the chain going but are never
    /// dropped.
    fn eliminate(self, removals: &OffsetSet, inserts: &OffsetSet) -> Vec<Move> {
        let _span = info_span!("changeset_eliminate_moves").entered();
        let mut eliminated: BitVec = BitVec::repeat(false, self.moves.len());

        let mut walk = |mut source: usize, mut destination: usize| {
            while let Some(index) = self.get(source, destination) {
                if !self.moves[index].is_mutated {
                    eliminated.set(index, true);
                }
                source += 1;
                destination += 1;
            }
        };
        for range in removals.ranges() {
            walk(range.end, range.start);
        }
        for range in inserts.ranges() {
            walk(range.start, range.end);
        }

        self.moves
            .into_iter()
            .zip(eliminated.iter().by_vals())
            .filter_map(|(mv, eliminated)| (!eliminated).then_some(mv))
            .collect()
    }
}

/// Splits the pairings into in-place mutations and candidate moves.
fn classify<T, S>(
    matching: &Matching,
    previous: &[T],
    current: &[T],
    strategy: &S,
) -> (OffsetSet, MoveTable)
where
    S: DiffStrategy<T>,
{
    let _span = info_span!("changeset_classify").entered();
    let mut mutations = OffsetSet::new();
    let mut table = MoveTable {
        moves: Vec::new(),
        by_destination: vec![None; current.len()],
    };
    for (new, reference) in matching.current.iter().enumerate() {
        let Reference::Resolved(old) = *reference else {
            continue;
        };
        let is_mutated = !strategy.equals(&previous[old], &current[new]);
        if old != new {
            table.by_destination[new] = Some(table.moves.len());
            table.moves.push(Move::new(old, new, is_mutated));
        } else if is_mutated {
            mutations.insert(new);
        }
    }
    (mutations, table)
}

/// Computes the changeset between two snapshots.
pub(crate) fn compute<T, S>(previous: &[T], current: &[T], strategy: &S) -> Changeset
where
    S: DiffStrategy<T>,
{
    let _span = info_span!(
        "changeset_compute",
        previous = previous.len(),
        current = current.len()
    )
    .entered();

    let mut matching = Matching::index(previous, current, strategy);
    matching.pair_unique();
    matching.consolidate_forward();
    matching.consolidate_backward();
    matching.pair_closest();
    #[cfg(all(debug_assertions, not(feature = "unchecked")))]
    matching.check_links();

    let inserts = Matching::unresolved(&matching.current);
    let removals = Matching::unresolved(&matching.previous);

    let (mutations, table) = classify(&matching, previous, current, strategy);

    let moves = table.eliminate(&removals, &inserts);

    Changeset {
        inserts,
        removals,
        mutations,
        moves,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{ByValue, Strategy};

    fn matched(previous: &[char], current: &[char]) -> Matching {
        let mut matching = Matching::index(previous, current, &ByValue);
        matching.pair_unique();
        matching.consolidate_forward();
        matching.consolidate_backward();
        matching.pair_closest();
        matching
    }

    #[test]
    fn test_closest_prefers_nearest_then_lower() {
        let bucket = Bucket {
            unmatched_current: 1,
            previous: BTreeSet::from([1, 5, 9]),
        };
        assert_eq!(bucket.closest(0), Some(1));
        assert_eq!(bucket.closest(4), Some(5));
        assert_eq!(bucket.closest(3), Some(1));
        assert_eq!(bucket.closest(7), Some(5));
        assert_eq!(bucket.closest(20), Some(9));
        assert_eq!(Bucket::default().closest(3), None);
    }

    #[test]
    fn test_unique_pairs_resolve_both_ways() {
        let matching = matched(&['a', 'b'], &['b', 'a']);
        assert_eq!(matching.current, vec![Reference::Resolved(1), Reference::Resolved(0)]);
        assert_eq!(matching.previous, vec![Reference::Resolved(1), Reference::Resolved(0)]);
    }

    #[test]
    fn test_adjacency_extends_unique_anchor_over_duplicates() {
        // Without consolidation the closest-offset heuristic would pair the
        // first `x` of the current snapshot with previous offset 0.
        let previous = ['x', 'q', 'a', 'x'];
        let current = ['a', 'x', 'x'];
        let matching = matched(&previous, &current);
        assert_eq!(matching.current[0], Reference::Resolved(2));
        assert_eq!(matching.current[1], Reference::Resolved(3));
        assert_eq!(matching.current[2], Reference::Resolved(0));
    }

    #[test]
    fn test_backward_consolidation() {
        let previous = ['x', 'a', 'z', 'x'];
        let current = ['x', 'a'];
        let matching = matched(&previous, &current);
        assert_eq!(matching.current[1], Reference::Resolved(1));
        assert_eq!(matching.current[0], Reference::Resolved(0));
        assert_eq!(
            Matching::unresolved(&matching.previous),
            OffsetSet::from([2, 3])
        );
    }

    #[test]
    fn test_surplus_occurrences_stay_unresolved() {
        let matching = matched(&['x', 'x'], &['x']);
        assert_eq!(matching.current, vec![Reference::Resolved(0)]);
        assert_eq!(Matching::unresolved(&matching.previous), OffsetSet::from([1]));

        let matching = matched(&['x'], &['x', 'x', 'x']);
        assert_eq!(matching.current[0], Reference::Resolved(0));
        assert_eq!(Matching::unresolved(&matching.current), OffsetSet::from([1, 2]));
    }

    #[test]
    fn test_classify_splits_mutations_from_moves() {
        let strategy = Strategy::new(|e: &(char, u8)| e.0, |a: &(char, u8), b: &(char, u8)| a == b);
        let previous: [(char, u8); 3] = [('a', 0), ('b', 0), ('c', 0)];
        let current: [(char, u8); 3] = [('a', 1), ('c', 0), ('b', 1)];
        let mut matching = Matching::index(&previous, &current, &strategy);
        matching.pair_unique();

        let (mutations, table) = classify(&matching, &previous, &current, &strategy);
        assert_eq!(mutations, OffsetSet::from([0]));
        assert_eq!(table.moves, vec![Move::new(2, 1, false), Move::new(1, 2, true)]);
        assert_eq!(table.by_destination, vec![None, Some(0), Some(1)]);
    }

    #[test]
    fn test_removal_block_absorbs_following_moves() {
        let changeset = compute(&['r', 'a', 'b', 'c'], &['a', 'b', 'c'], &ByValue);
        assert_eq!(changeset.removals, OffsetSet::from([0]));
        assert!(changeset.moves.is_empty());
    }

    #[test]
    fn test_insert_block_absorbs_following_moves() {
        let changeset = compute(&['a', 'b'], &['i', 'j', 'a', 'b'], &ByValue);
        assert_eq!(changeset.inserts, OffsetSet::from([0, 1]));
        assert!(changeset.moves.is_empty());
    }

    #[test]
    fn test_mutated_moves_survive_elimination() {
        let strategy = Strategy::new(|e: &(char, u8)| e.0, |a: &(char, u8), b: &(char, u8)| a == b);
        let previous: [(char, u8); 3] = [('r', 0), ('a', 0), ('b', 0)];
        let current: [(char, u8); 2] = [('a', 1), ('b', 0)];
        let changeset = compute(&previous, &current, &strategy);
        assert_eq!(changeset.removals, OffsetSet::from([0]));
        assert_eq!(changeset.moves, vec![Move::new(1, 0, true)]);
    }

    #[test]
    fn test_unrelated_moves_survive_elimination() {
        let changeset = compute(&['a', 'b', 'c'], &['c', 'a', 'b'], &ByValue);
        assert!(changeset.inserts.is_empty());
        assert!(changeset.removals.is_empty());
        assert_eq!(changeset.moves.len(), 3);
    }
}
