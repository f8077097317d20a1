//! One-shot removal of features hidden under earlier ones
//!
//! Features are visited in identifier order. A feature whose four bounding box
//! corners all fall on boxes of already accepted features is dropped from the
//! index. Only the corners are tested: a feature whose corners are covered
//! but whose middle pokes out between the covering features is still dropped.

use crate::feature::IndexEntry;
use crate::rtree::{Bounded, RTree};
use crate::utils::point_rect;
use geo::Rect;

/// Outcome of an elimination pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EliminationReport {
    /// Entries visited
    pub examined: usize,
    /// Entries dropped from the index
    pub removed: usize,
    /// Entries kept
    pub retained: usize,
}

/// Corner probes in the order bottom-left, top-left, top-right, bottom-right
pub fn corner_probes(bbox: &Rect<f64>) -> [Rect<f64>; 4] {
    let (min, max) = (bbox.min(), bbox.max());
    [
        point_rect(min.x, min.y),
        point_rect(min.x, max.y),
        point_rect(max.x, max.y),
        point_rect(max.x, min.y),
    ]
}

/// Remove every entry whose corners are already covered by earlier entries
///
/// The accepted set is a separate index built while walking the entries, so
/// `index` is only mutated by removals.
pub fn eliminate_overlaps(index: &mut RTree<IndexEntry>, max_entries: usize) -> EliminationReport {
    #[cfg(feature = "profiling")]
    profiling::scope!("overlap::eliminate_overlaps");

    let mut entries: Vec<IndexEntry> = index.all().into_iter().cloned().collect();
    entries.sort_by_key(IndexEntry::id);

    let mut report = EliminationReport {
        examined: entries.len(),
        ..Default::default()
    };

    let mut accepted: RTree<IndexEntry> = RTree::with_max_entries(max_entries);
    let mut entries = entries.into_iter();
    if let Some(first) = entries.next() {
        accepted.insert(first);
    }

    for entry in entries {
        let covered = corner_probes(&entry.bounding_box())
            .iter()
            .all(|probe| accepted.collides(probe));

        if covered {
            index.remove(&entry);
            report.removed += 1;
            tracing::trace!("Feature {} is hidden under earlier features", entry.id());
        } else {
            accepted.insert(entry);
        }
    }

    report.retained = report.examined - report.removed;
    tracing::info!(
        "Overlap elimination: {} examined, {} removed, {} retained",
        report.examined,
        report.removed,
        report.retained
    );
    report
}
