//! The reader seam over entity sources.
//!
//! File format parsing stays outside this library; anything that can
//! produce batches of entities in stream order plugs in here.

use std::collections::VecDeque;

use crate::entity::Entity;

/// A finite, non-restartable source of entity batches.
pub trait EntityReader {
    /// The next batch, or `None` once the source is exhausted.
    fn read(&mut self) -> Option<Vec<Entity>>;

    /// Progress through the source, in source-defined units.
    fn offset(&self) -> u64;

    /// Total size of the source, in the same units as [`EntityReader::offset`].
    fn size(&self) -> u64;
}

/// In-memory reader over pre-built entities, mainly for tests and small
/// pipelines. Progress units are entity counts.
#[derive(Debug, Default)]
pub struct VecReader {
    batches: VecDeque<Vec<Entity>>,
    offset: u64,
    size: u64,
}

impl VecReader {
    /// A reader delivering all entities in a single batch.
    pub fn new(entities: Vec<Entity>) -> Self {
        Self::with_batches(vec![entities])
    }

    /// A reader delivering the given batches one `read` at a time.
    pub fn with_batches(batches: Vec<Vec<Entity>>) -> Self {
        let size = batches.iter().map(|batch| batch.len() as u64).sum();
        Self {
            batches: batches.into(),
            offset: 0,
            size,
        }
    }
}

impl EntityReader for VecReader {
    fn read(&mut self) -> Option<Vec<Entity>> {
        let batch = self.batches.pop_front()?;
        self.offset += batch.len() as u64;
        Some(batch)
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Node;
    use crate::location::Location;

    #[test]
    fn delivers_batches_and_tracks_progress() {
        let batch = |ids: &[i64]| {
            ids.iter()
                .map(|&id| Entity::from(Node::new(id, Location::new(0, 0))))
                .collect::<Vec<_>>()
        };
        let mut reader = VecReader::with_batches(vec![batch(&[1, 2]), batch(&[3])]);
        assert_eq!(reader.size(), 3);
        assert_eq!(reader.offset(), 0);

        assert_eq!(reader.read().map(|b| b.len()), Some(2));
        assert_eq!(reader.offset(), 2);
        assert_eq!(reader.read().map(|b| b.len()), Some(1));
        assert_eq!(reader.offset(), 3);
        assert!(reader.read().is_none());
    }
}
