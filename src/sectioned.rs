use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
};

use crate::{
    changeset::{Changeset, Move},
    diff,
    offset_set::OffsetSet,
    strategy::DiffStrategy,
};

/// A section whose metadata or items changed between two versions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutatedSection {
    /// Offset of the section in the previous version.
    pub source: usize,
    /// Offset of the section in the current version.
    pub destination: usize,
    /// Changes to the items of the section.  Empty if only the section
    /// metadata changed.
    pub changeset: Changeset,
}

/// An atomic batch of changes to a collection of sections, each holding a
/// collection of items.
///
/// Every section reported as mutated in `sections.mutations` or as a mutated
/// move in `sections.moves` has an entry in `mutated_sections`.
#[derive(Clone, Debug, Default)]
pub struct SectionedChangeset {
    /// Changes to the sections themselves.
    pub sections: Changeset,
    pub mutated_sections: Vec<MutatedSection>,
}

impl SectionedChangeset {
    /// The changeset of a sectioned collection with no previous version.
    pub fn initial(len: usize) -> Self {
        SectionedChangeset {
            sections: Changeset::initial(len),
            mutated_sections: Vec::new(),
        }
    }

    /// Computes the changes between two versions of a sectioned collection.
    ///
    /// Sections are matched with `section_strategy`, whose equality need only
    /// consider section metadata.  Every section that survives into the current
    /// version then has its items, as projected by `items`, diffed against the
    /// items of the section at its new offset using `item_strategy`.  A section
    /// is mutated if its metadata changed or any of its items did.
    pub fn new<S, I, SS, IS, F>(
        previous: Option<&[S]>,
        current: &[S],
        section_strategy: &SS,
        items: F,
        item_strategy: &IS,
    ) -> Self
    where
        SS: DiffStrategy<S>,
        IS: DiffStrategy<I>,
        F: Fn(&S) -> &[I],
    {
        let Some(previous) = previous else {
            return SectionedChangeset::initial(current.len());
        };
        let metadata = diff::compute(previous, current, section_strategy);

        let move_of: HashMap<usize, &Move> = metadata.moves.iter().map(|mv| (mv.source, mv)).collect();
        let all_removals = metadata.all_removals();
        let all_inserts = metadata.all_inserts();
        let kept: Vec<usize> = (0..current.len())
            .filter(|&offset| !all_inserts.contains(offset))
            .collect();

        let mut mutated_sections = Vec::new();
        let mut mutations = OffsetSet::new();
        let mut moves = Vec::new();

        for (source, section) in previous.iter().enumerate() {
            if metadata.removals.contains(source) {
                continue;
            }
            let (destination, moved) = match move_of.get(&source) {
                Some(mv) => (mv.destination, Some(mv.is_mutated)),
                // Sections that did not move keep their relative order, so the
                // n-th of them in the previous version is the n-th of them in
                // the current one.
                None => match kept.get(source - all_removals.count_in(0..source)) {
                    Some(&destination) => (destination, None),
                    None => continue,
                },
            };

            let changeset =
                diff::compute(items(section), items(&current[destination]), item_strategy);
            let is_mutated = !changeset.has_no_changes()
                || metadata.mutations.contains(source)
                || moved == Some(true);

            if is_mutated {
                mutated_sections.push(MutatedSection {
                    source,
                    destination,
                    changeset,
                });
            }

            match moved {
                Some(_) => moves.push(Move::new(source, destination, is_mutated)),
                // A section shifted by neighbouring removals or insertions can
                // only be reported as mutated in place if its offset held.
                None if is_mutated && source != destination => {
                    moves.push(Move::new(source, destination, true))
                }
                None if is_mutated => {
                    mutations.insert(source);
                }
                None => {}
            }
        }

        SectionedChangeset {
            sections: Changeset {
                inserts: metadata.inserts,
                removals: metadata.removals,
                mutations,
                moves,
            },
            mutated_sections,
        }
    }

    pub fn has_no_changes(&self) -> bool {
        self.sections.has_no_changes() && self.mutated_sections.is_empty()
    }
}

impl PartialEq for SectionedChangeset {
    fn eq(&self, other: &Self) -> bool {
        fn sorted(sections: &[MutatedSection]) -> Vec<&MutatedSection> {
            let mut sections: Vec<_> = sections.iter().collect();
            sections.sort_by_key(|section| section.source);
            sections
        }

        self.sections == other.sections
            && sorted(&self.mutated_sections) == sorted(&other.mutated_sections)
    }
}

impl Eq for SectionedChangeset {}

impl Display for SectionedChangeset {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.sections)?;
        writeln!(f, "- changesets of mutated sections: <<<")?;
        for section in &self.mutated_sections {
            writeln!(f, "    section {} -> {}", section.source, section.destination)?;
            for line in section.changeset.to_string().lines() {
                writeln!(f, "    {line}")?;
            }
        }
        write!(f, "  >>>")
    }
}
