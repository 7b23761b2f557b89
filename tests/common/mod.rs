#![allow(dead_code)]

use flexdiff::{Changeset, OffsetSet};
use quickcheck::{Arbitrary, Gen};

/// An element with an identity and a content that may change between
/// versions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Item {
    pub id: u8,
    pub value: u8,
}

pub fn item(id: u8, value: u8) -> Item {
    Item { id, value }
}

pub fn diff(previous: &[Item], current: &[Item]) -> Changeset {
    Changeset::by_key(Some(previous), current, |item: &Item| item.id)
}

pub fn shuffle<T>(items: &mut [T], g: &mut Gen) {
    for i in (1..items.len()).rev() {
        let j = usize::arbitrary(g) % (i + 1);
        items.swap(i, j);
    }
}

/// Two versions in which every identifier occurs at most once.
#[derive(Clone, Debug)]
pub struct UniqueVersions {
    pub previous: Vec<Item>,
    pub current: Vec<Item>,
}

impl Arbitrary for UniqueVersions {
    fn arbitrary(g: &mut Gen) -> Self {
        let version = |g: &mut Gen| {
            let mut items = Vec::new();
            for id in 0..32u8 {
                if bool::arbitrary(g) {
                    items.push(item(id, u8::arbitrary(g) % 3));
                }
            }
            // Mostly keep the original order so that blocks of removals and
            // insertions show up next to runs of unmoved elements.
            if u8::arbitrary(g) % 3 == 0 {
                shuffle(&mut items, g);
            } else if items.len() > 1 {
                let from = usize::arbitrary(g) % items.len();
                let to = usize::arbitrary(g) % items.len();
                let moved = items.remove(from);
                items.insert(to, moved);
            }
            items
        };
        UniqueVersions {
            previous: version(g),
            current: version(g),
        }
    }
}

/// Two versions drawn from a small alphabet of identifiers, so identifiers
/// repeat within and across versions.
#[derive(Clone, Debug)]
pub struct DuplicateVersions {
    pub previous: Vec<Item>,
    pub current: Vec<Item>,
}

impl Arbitrary for DuplicateVersions {
    fn arbitrary(g: &mut Gen) -> Self {
        let alphabet = 1 + u8::arbitrary(g) % 5;
        let version = |g: &mut Gen| {
            let len = usize::arbitrary(g) % (g.size() / 4 + 1);
            (0..len)
                .map(|_| item(u8::arbitrary(g) % alphabet, u8::arbitrary(g) % 2))
                .collect::<Vec<_>>()
        };
        DuplicateVersions {
            previous: version(g),
            current: version(g),
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let current = self.current.clone();
        let previous = self.previous.clone();
        let shrunk_previous = self.previous.shrink().map(move |previous| DuplicateVersions {
            previous,
            current: current.clone(),
        });
        let shrunk_current = self.current.shrink().map(move |current| DuplicateVersions {
            previous: previous.clone(),
            current,
        });
        Box::new(shrunk_previous.chain(shrunk_current))
    }
}

impl Arbitrary for Item {
    fn arbitrary(g: &mut Gen) -> Self {
        item(u8::arbitrary(g) % 5, u8::arbitrary(g) % 2)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        Box::new(std::iter::empty())
    }
}

/// Checks that every offset of either version is classified at most once and
/// that the unreported offsets of both versions pair up.
pub fn is_classified_once(changeset: &Changeset, previous_len: usize, current_len: usize) -> bool {
    let sources: OffsetSet = changeset.moves.iter().map(|mv| mv.source).collect();
    let destinations: OffsetSet = changeset.moves.iter().map(|mv| mv.destination).collect();

    let in_bounds = changeset.removals.iter().all(|offset| offset < previous_len)
        && sources.iter().all(|offset| offset < previous_len)
        && changeset.inserts.iter().all(|offset| offset < current_len)
        && destinations.iter().all(|offset| offset < current_len)
        && changeset
            .mutations
            .iter()
            .all(|offset| offset < previous_len && offset < current_len);

    let disjoint = sources.len() == changeset.moves.len()
        && destinations.len() == changeset.moves.len()
        && sources.iter().all(|offset| !changeset.removals.contains(offset))
        && destinations.iter().all(|offset| !changeset.inserts.contains(offset))
        && changeset.mutations.iter().all(|offset| {
            !changeset.removals.contains(offset)
                && !sources.contains(offset)
                && !changeset.inserts.contains(offset)
                && !destinations.contains(offset)
        });

    in_bounds
        && disjoint
        && previous_len - changeset.removals.len() - sources.len()
            == current_len - changeset.inserts.len() - destinations.len()
}
