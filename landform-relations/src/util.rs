//! Conveniences around the two-pass workflow: first-pass driving and
//! memory telemetry.

use std::io;

use landform_core::{Entity, EntityReader, Relation};

/// First-pass surface of a relations manager, object-safe so that one
/// read of the input can feed several managers.
pub trait RelationsCollector {
    /// Offer one relation from the first pass.
    fn collect_relation(&mut self, relation: &Relation);

    /// Sort the member databases once the first pass is done.
    fn prepare_for_lookup(&mut self);
}

/// Read all relations from `reader` into the given managers, then call
/// `prepare_for_lookup` on each, leaving them ready for the second pass.
///
/// Readers already filtered to relations work best, but any entity
/// stream is accepted; other kinds are skipped.
pub fn read_relations<R>(reader: &mut R, managers: &mut [&mut dyn RelationsCollector])
where
    R: EntityReader + ?Sized,
{
    while let Some(batch) = reader.read() {
        collect_batch(&batch, managers);
    }
    for manager in managers.iter_mut() {
        manager.prepare_for_lookup();
    }
}

/// Like [`read_relations`], reporting reader progress to `progress`
/// after every batch and once more with the total size when done.
pub fn read_relations_with_progress<R>(
    reader: &mut R,
    mut progress: impl FnMut(u64),
    managers: &mut [&mut dyn RelationsCollector],
) where
    R: EntityReader + ?Sized,
{
    while let Some(batch) = reader.read() {
        progress(reader.offset());
        collect_batch(&batch, managers);
    }
    for manager in managers.iter_mut() {
        manager.prepare_for_lookup();
    }
    progress(reader.size());
}

fn collect_batch(batch: &[Entity], managers: &mut [&mut dyn RelationsCollector]) {
    for entity in batch {
        if let Entity::Relation(relation) = entity {
            for manager in managers.iter_mut() {
                manager.collect_relation(relation);
            }
        }
    }
}

/// Memory used by the components of a relations manager, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    pub relations_db: usize,
    pub members_db: usize,
    pub stash: usize,
}

impl MemoryUsage {
    pub fn total(&self) -> usize {
        self.relations_db + self.members_db + self.stash
    }
}

/// Write the memory usage table: the three components plus the total,
/// in kilobytes, right-aligned in an eight-column field.
///
/// # Examples
/// ```
/// use landform_relations::{print_used_memory, MemoryUsage};
///
/// let usage = MemoryUsage { relations_db: 2048, members_db: 1024, stash: 4096 };
/// let mut out = Vec::new();
/// print_used_memory(&mut out, &usage).unwrap();
/// let text = String::from_utf8(out).unwrap();
/// assert!(text.contains("relations:        2 kB"));
/// assert!(text.contains("total:            7 kB"));
/// ```
pub fn print_used_memory<W: io::Write>(out: &mut W, usage: &MemoryUsage) -> io::Result<()> {
    writeln!(out, "  relations: {:>8} kB", usage.relations_db / 1024)?;
    writeln!(out, "  members:   {:>8} kB", usage.members_db / 1024)?;
    writeln!(out, "  stash:     {:>8} kB", usage.stash / 1024)?;
    writeln!(out, "  total:     {:>8} kB", usage.total() / 1024)?;
    writeln!(out, "  ======================")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_table_is_aligned_and_closed_by_divider() {
        let usage = MemoryUsage {
            relations_db: 10 * 1024,
            members_db: 200 * 1024,
            stash: 3000 * 1024,
        };
        let mut out = Vec::new();
        print_used_memory(&mut out, &usage).expect("write to vec");
        let text = String::from_utf8(out).expect("utf-8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "  relations:       10 kB",
                "  members:        200 kB",
                "  stash:         3000 kB",
                "  total:         3210 kB",
                "  ======================",
            ]
        );
    }
}
