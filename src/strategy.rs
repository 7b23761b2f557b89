//! Strategies for identifying and comparing elements.
//!
//! The diff engine needs two things from the caller: a way to tell which
//! elements of the two snapshots denote the same logical element (the
//! identifier), and a way to tell whether two such elements differ in content
//! (the equality predicate).  Both are bundled in a [`DiffStrategy`].
//!
//! The identifier must be a pure function of an element's identity.  Deriving
//! it from content that changes between snapshots produces a correct-looking
//! but meaningless diff; this is not checked.

use std::{fmt::Debug, hash::Hash, rc::Rc, sync::Arc};

use derivative::Derivative;

/// Identifies elements and compares elements assumed to share an identity.
pub trait DiffStrategy<T> {
    /// The identifier of an element.  May borrow from the element.
    type Id<'a>: Hash + Eq
    where
        T: 'a;

    fn identify<'a>(&self, element: &'a T) -> Self::Id<'a>;

    /// Returns `true` if `previous` and `current` are unchanged.
    fn equals(&self, previous: &T, current: &T) -> bool;
}

/// The address of a shared allocation, used as an identity-based identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl ObjectId {
    pub fn of<T: ?Sized>(ptr: *const T) -> Self {
        ObjectId(ptr.cast::<()>() as usize)
    }
}

/// Types whose values have an object identity distinct from their content.
pub trait ObjectIdentity {
    fn object_id(&self) -> ObjectId;
}

impl<T: ?Sized> ObjectIdentity for Rc<T> {
    fn object_id(&self) -> ObjectId {
        ObjectId::of(Rc::as_ptr(self))
    }
}

impl<T: ?Sized> ObjectIdentity for Arc<T> {
    fn object_id(&self) -> ObjectId {
        ObjectId::of(Arc::as_ptr(self))
    }
}

impl<T: ?Sized> ObjectIdentity for &T {
    fn object_id(&self) -> ObjectId {
        ObjectId::of(*self as *const T)
    }
}

/// Identifies elements by value and compares them by value.
///
/// Works best when values are unique within a snapshot; a changed value is
/// always reported as a removal plus an insertion.
#[derive(Clone, Copy, Debug, Default)]
pub struct ByValue;

impl<T: Hash + Eq> DiffStrategy<T> for ByValue {
    type Id<'a>
        = &'a T
    where
        T: 'a;

    fn identify<'a>(&self, element: &'a T) -> &'a T {
        element
    }

    fn equals(&self, previous: &T, current: &T) -> bool {
        previous == current
    }
}

/// Identifies and compares elements by object identity.
#[derive(Clone, Copy, Debug, Default)]
pub struct ByIdentity;

impl<T: ObjectIdentity> DiffStrategy<T> for ByIdentity {
    type Id<'a>
        = ObjectId
    where
        T: 'a;

    fn identify<'a>(&self, element: &'a T) -> ObjectId {
        element.object_id()
    }

    fn equals(&self, previous: &T, current: &T) -> bool {
        previous.object_id() == current.object_id()
    }
}

/// Identifies elements by object identity and compares them by value.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityThenValue;

impl<T: ObjectIdentity + PartialEq> DiffStrategy<T> for IdentityThenValue {
    type Id<'a>
        = ObjectId
    where
        T: 'a;

    fn identify<'a>(&self, element: &'a T) -> ObjectId {
        element.object_id()
    }

    fn equals(&self, previous: &T, current: &T) -> bool {
        previous == current
    }
}

/// Identifies elements with a key function and compares them by value.
#[derive(Clone, Copy, Debug)]
pub struct ByKey<F>(pub F);

impl<T, K, F> DiffStrategy<T> for ByKey<F>
where
    T: PartialEq,
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    type Id<'a>
        = K
    where
        T: 'a;

    fn identify<'a>(&self, element: &'a T) -> K {
        (self.0)(element)
    }

    fn equals(&self, previous: &T, current: &T) -> bool {
        previous == current
    }
}

/// A strategy built from two arbitrary functions.
#[derive(Clone, Copy, Debug)]
pub struct Strategy<I, E> {
    identify: I,
    equals: E,
}

impl<I, E> Strategy<I, E> {
    pub fn new(identify: I, equals: E) -> Self {
        Strategy { identify, equals }
    }
}

impl<T, K, I, E> DiffStrategy<T> for Strategy<I, E>
where
    K: Hash + Eq,
    I: Fn(&T) -> K,
    E: Fn(&T, &T) -> bool,
{
    type Id<'a>
        = K
    where
        T: 'a;

    fn identify<'a>(&self, element: &'a T) -> K {
        (self.identify)(element)
    }

    fn equals(&self, previous: &T, current: &T) -> bool {
        (self.equals)(previous, current)
    }
}

/// Selects whether objects are identified or compared by identity or by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectDiffStrategy {
    Identity,
    Value,
}

/// A strategy for hashable objects that picks the identifying and comparing
/// criteria independently.  Defaults to identifying by identity and comparing
/// by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectStrategy {
    pub identifying: ObjectDiffStrategy,
    pub comparing: ObjectDiffStrategy,
}

impl ObjectStrategy {
    pub fn new(identifying: ObjectDiffStrategy, comparing: ObjectDiffStrategy) -> Self {
        ObjectStrategy {
            identifying,
            comparing,
        }
    }
}

impl Default for ObjectStrategy {
    fn default() -> Self {
        ObjectStrategy::new(ObjectDiffStrategy::Identity, ObjectDiffStrategy::Value)
    }
}

/// The identifier produced by an [`ObjectStrategy`].
#[derive(Derivative)]
#[derivative(
    Clone(bound = ""),
    Copy(bound = ""),
    Debug(bound = "T: Debug"),
    Hash(bound = "T: Hash"),
    PartialEq(bound = "T: PartialEq"),
    Eq(bound = "T: Eq")
)]
pub enum ObjectKey<'a, T> {
    Identity(ObjectId),
    Value(&'a T),
}

impl<T: ObjectIdentity + Hash + Eq> DiffStrategy<T> for ObjectStrategy {
    type Id<'a>
        = ObjectKey<'a, T>
    where
        T: 'a;

    fn identify<'a>(&self, element: &'a T) -> ObjectKey<'a, T> {
        match self.identifying {
            ObjectDiffStrategy::Identity => ObjectKey::Identity(element.object_id()),
            ObjectDiffStrategy::Value => ObjectKey::Value(element),
        }
    }

    fn equals(&self, previous: &T, current: &T) -> bool {
        match self.comparing {
            ObjectDiffStrategy::Identity => previous.object_id() == current.object_id(),
            ObjectDiffStrategy::Value => previous == current,
        }
    }
}
