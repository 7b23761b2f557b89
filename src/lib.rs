//! Identity-keyed diffing of ordered collections.
//!
//! Given two versions of an ordered collection, [`Changeset::new`] describes
//! how to turn the first into the second as insertions, removals, in-place
//! mutations and moves, all in terms of zero-based offsets.  Elements keep
//! their identity across versions through a caller-chosen [`DiffStrategy`],
//! so a consumer can patch a live view incrementally instead of replacing it.
//!
//! ```
//! use flexdiff::{Changeset, Move};
//!
//! let previous = ['a', 'b', 'c', 'd'];
//! let current = ['b', 'c', 'a', 'd'];
//! let changeset = Changeset::by_value(Some(&previous[..]), &current);
//!
//! assert!(changeset.inserts.is_empty() && changeset.removals.is_empty());
//! assert!(changeset.moves.contains(&Move::new(0, 2, false)));
//! assert_eq!(changeset.apply(&previous, &current).unwrap(), current);
//! ```

pub mod changeset;
pub mod error;
pub mod offset_set;
pub mod sectioned;
pub mod snapshot;
pub mod strategy;
pub mod tracing_support;

mod diff;

pub use changeset::{Changeset, Move};
pub use error::ApplyError;
pub use offset_set::OffsetSet;
pub use sectioned::{MutatedSection, SectionedChangeset};
pub use snapshot::Snapshot;
pub use strategy::{
    ByIdentity, ByKey, ByValue, DiffStrategy, IdentityThenValue, ObjectDiffStrategy, ObjectId,
    ObjectIdentity, ObjectKey, ObjectStrategy, Strategy,
};
