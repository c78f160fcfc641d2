use std::collections::HashSet;

use crate::{StoreError, VideoRecord};

/// Aligned video records and embedding rows.
///
/// Invariants, enforced by every constructor:
/// - `records.len() == vectors.len()`, row `i` belongs to record `i`
/// - all rows share one non-zero dimension
/// - record identities are unique
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    records: Vec<VideoRecord>,
    vectors: Vec<Vec<f32>>,
}

impl Snapshot {
    /// Returns a snapshot with no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a snapshot, validating alignment, dimension, and identity
    /// uniqueness.
    pub fn new(records: Vec<VideoRecord>, vectors: Vec<Vec<f32>>) -> Result<Self, StoreError> {
        Self::empty().merge(records, vectors)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Embedding dimension, or `None` for an empty snapshot.
    pub fn dim(&self) -> Option<usize> {
        self.vectors.first().map(|v| v.len())
    }

    pub fn records(&self) -> &[VideoRecord] {
        &self.records
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    /// Returns the row for record `i`.
    pub fn get(&self, i: usize) -> Option<(&VideoRecord, &[f32])> {
        Some((self.records.get(i)?, self.vectors.get(i)?.as_slice()))
    }

    /// Iterates `(record, vector)` pairs in row order.
    pub fn iter(&self) -> impl Iterator<Item = (&VideoRecord, &[f32])> {
        self.records
            .iter()
            .zip(self.vectors.iter().map(|v| v.as_slice()))
    }

    /// Returns true if a record with this identity exists.
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Row index of the record with this identity.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    /// Returns a new snapshot with `records`/`vectors` appended.
    ///
    /// Existing rows keep their order and values. Merge is append-only: an
    /// identity that is already present, or repeated within the batch, is
    /// rejected with [`StoreError::DuplicateIdentity`]. To replace a row,
    /// remove it with [`Snapshot::without`] first.
    pub fn merge(
        &self,
        records: Vec<VideoRecord>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Snapshot, StoreError> {
        if records.len() != vectors.len() {
            return Err(StoreError::Misaligned {
                records: records.len(),
                vectors: vectors.len(),
            });
        }

        let expected = match self.dim() {
            Some(d) => d,
            None => vectors.first().map(|v| v.len()).unwrap_or(0),
        };
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected || v.is_empty()) {
            return Err(StoreError::DimensionMismatch {
                expected,
                got: bad.len(),
            });
        }

        let mut seen: HashSet<&str> = self.records.iter().map(|r| r.id.as_str()).collect();
        for r in &records {
            if !seen.insert(r.id.as_str()) {
                return Err(StoreError::DuplicateIdentity(r.id.clone()));
            }
        }

        let mut merged = self.clone();
        merged.records.extend(records);
        merged.vectors.extend(vectors);
        Ok(merged)
    }

    /// Returns a copy without the given identities, preserving row order.
    pub fn without(&self, ids: &[&str]) -> Snapshot {
        let drop: HashSet<&str> = ids.iter().copied().collect();
        let (records, vectors) = self
            .records
            .iter()
            .zip(&self.vectors)
            .filter(|(r, _)| !drop.contains(r.id.as_str()))
            .map(|(r, v)| (r.clone(), v.clone()))
            .unzip();
        Snapshot { records, vectors }
    }
}
