use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

/// Containers that can report whether they hold anything.
///
/// Used by [`ApiResult::error_if_empty`](crate::ApiResult::error_if_empty).
pub trait Emptiness {
    fn is_empty(&self) -> bool;
}

impl<T> Emptiness for [T] {
    fn is_empty(&self) -> bool {
        <[T]>::is_empty(self)
    }
}

impl<T> Emptiness for Vec<T> {
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

impl<T> Emptiness for VecDeque<T> {
    fn is_empty(&self) -> bool {
        VecDeque::is_empty(self)
    }
}

impl Emptiness for str {
    fn is_empty(&self) -> bool {
        str::is_empty(self)
    }
}

impl Emptiness for String {
    fn is_empty(&self) -> bool {
        String::is_empty(self)
    }
}

impl<K, V, S> Emptiness for HashMap<K, V, S> {
    fn is_empty(&self) -> bool {
        HashMap::is_empty(self)
    }
}

impl<T, S> Emptiness for HashSet<T, S> {
    fn is_empty(&self) -> bool {
        HashSet::is_empty(self)
    }
}

impl<K, V> Emptiness for BTreeMap<K, V> {
    fn is_empty(&self) -> bool {
        BTreeMap::is_empty(self)
    }
}

impl<T> Emptiness for BTreeSet<T> {
    fn is_empty(&self) -> bool {
        BTreeSet::is_empty(self)
    }
}

// An absent value counts as empty.
impl<T> Emptiness for Option<T> {
    fn is_empty(&self) -> bool {
        self.is_none()
    }
}

impl<T: Emptiness + ?Sized> Emptiness for &T {
    fn is_empty(&self) -> bool {
        T::is_empty(self)
    }
}
