//! Utility types.

use llsql_runtime::TokenKind;
use std::fmt;

type BuildHasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;

pub type Map<K, V> = indexmap::IndexMap<K, V, BuildHasher>;
pub type Set<T> = indexmap::IndexSet<T, BuildHasher>;

/// A set of token kinds, `NONE` included.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TokenSet {
    inner: bit_set::BitSet,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, kind: TokenKind) -> bool {
        self.inner.contains(kind.index())
    }

    pub fn insert(&mut self, kind: TokenKind) -> bool {
        self.inner.insert(kind.index())
    }

    pub fn remove(&mut self, kind: TokenKind) -> bool {
        self.inner.remove(kind.index())
    }

    /// Add all elements of `other`, returning whether this set has changed.
    pub fn union_with(&mut self, other: &Self) -> bool {
        let len = self.inner.len();
        self.inner.union_with(&other.inner);
        self.inner.len() != len
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.inner.is_disjoint(&other.inner)
    }

    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            inner: self.inner.intersection(&other.inner).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = TokenKind> + '_ {
        self.inner.iter().filter_map(TokenKind::from_index)
    }
}

impl FromIterator<TokenKind> for TokenSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TokenKind>,
    {
        Self {
            inner: iter.into_iter().map(TokenKind::index).collect(),
        }
    }
}

impl fmt::Display for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, kind) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", kind)?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_set() {
        let mut set: TokenSet = [TokenKind::Select, TokenKind::Eoi].into_iter().collect();
        assert!(set.contains(TokenKind::Select));
        assert!(!set.contains(TokenKind::None));

        let other: TokenSet = [TokenKind::None, TokenKind::Select].into_iter().collect();
        assert!(set.union_with(&other));
        assert!(!set.union_with(&other));
        assert_eq!(set.len(), 3);
        assert_eq!(set.to_string(), "{NONE, SELECT, EOI}");

        let third: TokenSet = [TokenKind::Comma].into_iter().collect();
        assert!(set.is_disjoint(&third));
        assert_eq!(set.intersection(&other), other);
    }
}
