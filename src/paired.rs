//! Sparse associative container for directional derivatives.
//!
//! A [`PairedVector`] maps global coordinate DOF ids to a payload: a scalar, a small vector or a
//! dense matrix. Entries are kept in a flat vector sorted by key, which gives deterministic
//! iteration order and makes accumulation results independent of insertion order.
use std::ops::{AddAssign, Mul, MulAssign};

#[derive(Debug, Clone, PartialEq)]
pub struct PairedVector<P> {
    entries: Vec<(usize, P)>,
}

impl<P> Default for PairedVector<P> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<P> PairedVector<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, key: usize) -> Option<&P> {
        self.entries
            .binary_search_by_key(&key, |(k, _)| *k)
            .ok()
            .map(|idx| &self.entries[idx].1)
    }

    pub fn contains_key(&self, key: usize) -> bool {
        self.get(key).is_some()
    }

    /// Returns the payload for `key`, inserting `f()` first if the key is absent.
    pub fn entry_or_insert_with(&mut self, key: usize, f: impl FnOnce() -> P) -> &mut P {
        let idx = match self.entries.binary_search_by_key(&key, |(k, _)| *k) {
            Ok(idx) => idx,
            Err(idx) => {
                self.entries.insert(idx, (key, f()));
                idx
            }
        };
        &mut self.entries[idx].1
    }

    /// Iterates over `(key, payload)` pairs in increasing key order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &P)> + '_ {
        self.entries.iter().map(|(k, p)| (*k, p))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut P)> + '_ {
        self.entries.iter_mut().map(|(k, p)| (*k, p))
    }

    pub fn keys(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn map<Q>(&self, mut f: impl FnMut(&P) -> Q) -> PairedVector<Q> {
        PairedVector {
            entries: self.entries.iter().map(|(k, p)| (*k, f(p))).collect(),
        }
    }
}

impl<P: AddAssign> PairedVector<P> {
    /// Accumulates `value` into the entry for `key`, inserting it if absent.
    pub fn add(&mut self, key: usize, value: P) {
        match self.entries.binary_search_by_key(&key, |(k, _)| *k) {
            Ok(idx) => self.entries[idx].1 += value,
            Err(idx) => self.entries.insert(idx, (key, value)),
        }
    }

    /// Accumulates `f(q)` for every entry `q` of `other`.
    pub fn add_mapped<Q>(&mut self, other: &PairedVector<Q>, mut f: impl FnMut(&Q) -> P) {
        for (key, q) in other.iter() {
            self.add(key, f(q));
        }
    }
}

impl<P: AddAssign + Clone> PairedVector<P> {
    /// Accumulates `factor * other`.
    pub fn add_scaled<S: Copy>(&mut self, other: &PairedVector<P>, factor: S)
    where
        P: Mul<S, Output = P>,
    {
        self.add_mapped(other, |p| p.clone() * factor);
    }
}

impl<P> PairedVector<P> {
    /// Multiplies every payload by `factor`.
    pub fn scale<S: Copy>(&mut self, factor: S)
    where
        P: MulAssign<S>,
    {
        for (_, p) in &mut self.entries {
            *p *= factor;
        }
    }
}

impl<P> FromIterator<(usize, P)> for PairedVector<P>
where
    P: AddAssign,
{
    fn from_iter<I: IntoIterator<Item = (usize, P)>>(iter: I) -> Self {
        let mut result = Self::new();
        for (key, value) in iter {
            result.add(key, value);
        }
        result
    }
}

impl<P> IntoIterator for PairedVector<P> {
    type Item = (usize, P);
    type IntoIter = std::vec::IntoIter<(usize, P)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
