//! Ranges that follow the document as it changes.
//!
//! A live range is registered in an arena owned by the document. Every
//! operation applied to the document updates every registered range, so a
//! range created before a series of edits still covers the same content
//! afterwards. A range whose block is removed is invalidated; reading it
//! returns `None` from then on.
//!
//! Ranges stay in the arena until they are detached. Whoever creates a live
//! range owns it and must detach it on every exit path.
//!
//! ```ignore
//! let id = writer.create_live_range(range);
//! run_user_callback(writer)?;
//! if let Some(range) = writer.live_range(id) {
//!   writer.remove(range)?;
//! }
//! writer.detach_live_range(id);
//! ```

use slotmap::SlotMap;

use crate::{
  operation::Operation,
  position::{
    Assoc,
    Position,
    Range,
  },
};

slotmap::new_key_type! {
    pub struct LiveRangeId;
}

#[derive(Debug, Clone)]
struct Tracked {
  /// `None` once the range no longer maps to the document.
  range:       Option<Range>,
  start_assoc: Assoc,
  end_assoc:   Assoc,
}

#[derive(Debug, Default)]
pub struct LiveRanges {
  ranges: SlotMap<LiveRangeId, Tracked>,
}

impl LiveRanges {
  pub fn new() -> Self {
    Self::default()
  }

  /// Track `range`. Insertions at either boundary never extend it.
  pub fn insert(&mut self, range: Range) -> LiveRangeId {
    self.ranges.insert(Tracked {
      range:       Some(range),
      start_assoc: Assoc::After,
      end_assoc:   Assoc::Before,
    })
  }

  /// Track a collapsed marker that stays before text inserted at it.
  pub fn insert_marker(&mut self, position: Position) -> LiveRangeId {
    self.ranges.insert(Tracked {
      range:       Some(Range::collapsed(position)),
      start_assoc: Assoc::Before,
      end_assoc:   Assoc::Before,
    })
  }

  pub fn get(&self, id: LiveRangeId) -> Option<Range> {
    self.ranges.get(id).and_then(|tracked| tracked.range)
  }

  pub fn contains(&self, id: LiveRangeId) -> bool {
    self.ranges.contains_key(id)
  }

  /// Stop tracking `id`. Returns false if it was already detached.
  pub fn remove(&mut self, id: LiveRangeId) -> bool {
    self.ranges.remove(id).is_some()
  }

  pub fn len(&self) -> usize {
    self.ranges.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ranges.is_empty()
  }

  /// Update every tracked range for an applied operation.
  pub(crate) fn map(&mut self, operation: &Operation) {
    for tracked in self.ranges.values_mut() {
      let Some(range) = tracked.range else {
        continue;
      };
      let start = operation.map_position(range.start, tracked.start_assoc);
      let end = operation.map_position(range.end, tracked.end_assoc);
      tracked.range = match (start, end) {
        (Some(start), Some(end)) if end.offset < start.offset => Some(Range::collapsed(start)),
        (Some(start), Some(end)) => Some(Range { start, end }),
        _ => None,
      };
    }
  }
}

#[cfg(test)]
mod tests {
  use std::num::NonZeroUsize;

  use smallvec::smallvec;

  use super::*;
  use crate::node::{
    BlockId,
    Runs,
    TextRun,
  };

  fn block(n: usize) -> BlockId {
    BlockId::new(NonZeroUsize::new(n).unwrap())
  }

  fn insert(offset: usize, text: &str) -> Operation {
    Operation::InsertText {
      at:      Position::new(block(1), offset),
      content: smallvec![TextRun::new(text)],
    }
  }

  #[test]
  fn range_does_not_grow_at_boundaries() {
    let mut ranges = LiveRanges::new();
    let id = ranges.insert(Range::new(block(1), 2, 4));

    ranges.map(&insert(2, "xx"));
    assert_eq!(ranges.get(id), Some(Range::new(block(1), 4, 6)));

    ranges.map(&insert(6, "yy"));
    assert_eq!(ranges.get(id), Some(Range::new(block(1), 4, 6)));
  }

  #[test]
  fn range_shrinks_with_removal() {
    let mut ranges = LiveRanges::new();
    let id = ranges.insert(Range::new(block(1), 2, 6));
    ranges.map(&Operation::RemoveText {
      range:   Range::new(block(1), 0, 4),
      removed: Runs::new(),
    });
    assert_eq!(ranges.get(id), Some(Range::new(block(1), 0, 2)));
  }

  #[test]
  fn marker_stays_before_insertions() {
    let mut ranges = LiveRanges::new();
    let id = ranges.insert_marker(Position::new(block(1), 3));
    ranges.map(&insert(3, "abc"));
    assert_eq!(ranges.get(id), Some(Range::collapsed(Position::new(block(1), 3))));
  }

  #[test]
  fn removed_block_invalidates_and_detach_releases() {
    let mut ranges = LiveRanges::new();
    let id = ranges.insert(Range::new(block(1), 0, 1));
    ranges.map(&Operation::RemoveBlock {
      id:    block(1),
      index: 0,
      block: None,
    });
    assert_eq!(ranges.get(id), None);
    assert!(ranges.contains(id));
    assert!(ranges.remove(id));
    assert!(!ranges.remove(id));
    assert!(ranges.is_empty());
  }
}
