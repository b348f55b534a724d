//! Performing a match as its own batch.
//!
//! The listener only plans: it captures what matched and the document
//! version it matched against, and enqueues the plan. The plan runs as a new
//! local batch once the keystroke's batch has been dispatched, so the
//! keystroke and the autoformat are separate undo steps.
//!
//! Text that has to go away after a user action ran is tracked through live
//! ranges. They are created before the action and detached on every path out
//! of the plan, including errors raised by the action.

use smallvec::SmallVec;
use the_doc::{
  document,
  live_range::LiveRangeId,
  node::{
    Attributes,
    BlockId,
  },
  position::Range,
  writer::Writer,
};
use tracing::debug;

use crate::{
  matcher::{
    BlockMatch,
    MatchResult,
  },
  rule::{
    ActionOutcome,
    BlockAction,
    InlineAction,
  },
  transform::{
    SearchBoundary,
    Substitution,
  },
};

#[derive(Debug, Clone)]
pub(crate) enum Plan {
  Block {
    block:   BlockId,
    matched: BlockMatch,
    action:  BlockAction,
  },
  Inline {
    block:  BlockId,
    result: MatchResult,
    action: InlineAction,
  },
  Substitute {
    substitution: Substitution,
    boundary:     SearchBoundary,
  },
}

impl Plan {
  /// Run the plan, unless the document changed since it was made.
  pub(crate) fn run(self, writer: &mut Writer<'_>, version: u64) -> document::Result<()> {
    if writer.document().version() != version {
      debug!(
        expected = version,
        found = writer.document().version(),
        "document changed before autoformat ran, skipping"
      );
      return Ok(());
    }
    match self {
      Plan::Block {
        block,
        matched,
        action,
      } => apply_block(writer, block, &matched, &action),
      Plan::Inline {
        block,
        result,
        action,
      } => apply_inline(writer, block, &result, &action),
      Plan::Substitute {
        substitution,
        boundary,
      } => apply_substitution(writer, &substitution, &boundary),
    }
  }
}

/// Track `ranges`; on failure nothing stays tracked.
fn track(
  writer: &mut Writer<'_>,
  ranges: impl IntoIterator<Item = Range>,
) -> document::Result<SmallVec<[LiveRangeId; 4]>> {
  let mut ids = SmallVec::new();
  for range in ranges {
    match writer.create_live_range(range) {
      Ok(id) => ids.push(id),
      Err(err) => {
        release(writer, &ids);
        return Err(err);
      },
    }
  }
  Ok(ids)
}

fn release(writer: &mut Writer<'_>, ids: &[LiveRangeId]) {
  for id in ids {
    writer.detach_live_range(*id);
  }
}

/// Remove what the live ranges still cover, last in the block first. Ranges
/// that no longer map to the document are skipped.
fn remove_tracked(writer: &mut Writer<'_>, ids: &[LiveRangeId]) -> document::Result<()> {
  let mut ranges: SmallVec<[Range; 4]> = ids.iter().filter_map(|id| writer.live_range(*id)).collect();
  if ranges.len() < ids.len() {
    debug!(lost = ids.len() - ranges.len(), "autoformat range invalidated by its action");
  }
  ranges.sort_by_key(|range| std::cmp::Reverse(range.start.offset));
  for range in ranges {
    writer.remove(range)?;
  }
  Ok(())
}

fn apply_block(
  writer: &mut Writer<'_>,
  block: BlockId,
  matched: &BlockMatch,
  action: &BlockAction,
) -> document::Result<()> {
  let trigger = track(writer, [Range::new(block, matched.range.start, matched.range.end)])?;

  let result = match action {
    BlockAction::Command(name) => writer
      .execute(name, &Default::default())
      .map(|()| ActionOutcome::Default),
    BlockAction::Callback(callback) => callback(writer, matched),
  }
  .and_then(|outcome| {
    debug!(%block, ?outcome, "block autoformat");
    if outcome.removes_trigger() {
      remove_tracked(writer, &trigger)
    } else {
      Ok(())
    }
  });

  release(writer, &trigger);
  result
}

fn apply_inline(
  writer: &mut Writer<'_>,
  block: BlockId,
  result: &MatchResult,
  action: &InlineAction,
) -> document::Result<()> {
  let format: SmallVec<[Range; 2]> = result
    .format
    .iter()
    .map(|range| Range::new(block, range.start, range.end))
    .collect();
  let remove = track(
    writer,
    result
      .remove
      .iter()
      .map(|range| Range::new(block, range.start, range.end)),
  )?;

  let outcome = match action {
    InlineAction::Command(key) => format_with_attribute(writer, key, &format),
    InlineAction::Callback(callback) => callback(writer, format.as_slice()),
  };
  let result = outcome.and_then(|outcome| {
    debug!(%block, format = format.len(), remove = remove.len(), ?outcome, "inline autoformat");
    if outcome.removes_trigger() {
      remove_tracked(writer, &remove)
    } else {
      Ok(())
    }
  });

  release(writer, &remove);
  result
}

/// Set `key` on every range, then stop typing with it.
fn format_with_attribute(
  writer: &mut Writer<'_>,
  key: &str,
  ranges: &[Range],
) -> document::Result<ActionOutcome> {
  for range in ranges {
    writer.set_attribute(*range, key, "true")?;
  }
  writer.remove_selection_attribute(key);
  Ok(ActionOutcome::Default)
}

fn apply_substitution(
  writer: &mut Writer<'_>,
  substitution: &Substitution,
  boundary: &SearchBoundary,
) -> document::Result<()> {
  let Substitution { range, to } = substitution;
  writer.replace(*range, to.clone(), Attributes::new())?;

  let end = range.start.shifted(to.chars().count());
  let marker = writer.create_marker(end)?;
  if let Some(previous) = boundary.replace(marker) {
    writer.detach_live_range(previous);
  }
  debug!(%range.start, to = %to, "text transformation");
  Ok(())
}
