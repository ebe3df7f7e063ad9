//! Record merge
//!
//! Builds the complete write payload for a commit. Every leaf field is
//! resolved on its own: draft value (present and non-empty), else the
//! stored value, else the codec default. Owned collections and shift
//! notes are never rebuilt from the draft.

use super::draft::Draft;
use super::fields::{default_for, DefaultContext, FieldId};
use crate::database::{Record, RecordStatus};

/// Merge `draft` over `persisted` into a full record.
///
/// `persisted` is the last-known stored copy of the chart being edited, or
/// `None` for a new chart. A new chart gets an MRN generated here, at merge
/// time, when the draft does not carry one. An existing MRN is never
/// replaced.
pub fn merge(draft: &Draft, persisted: Option<&Record>, ctx: &DefaultContext) -> Record {
    let mut merged = persisted.cloned().unwrap_or_default();
    let is_update = persisted.is_some_and(|record| record.id.is_some());

    for field in FieldId::ALL {
        let value = resolve(field, draft, persisted, ctx, is_update);

        if let Err(e) = field.assign(&mut merged, &value) {
            // Only reachable with a corrupt stored select value
            tracing::warn!("Falling back to default for {}: {}", field, e);
            let fallback = default_for(field, ctx);
            let _ = field.assign(&mut merged, &fallback);
        }
    }

    merged.status = RecordStatus::Active;

    tracing::debug!(
        "Merged {} draft fields into {}",
        draft.len(),
        merged.id().unwrap_or("new record")
    );

    merged
}

fn resolve(
    field: FieldId,
    draft: &Draft,
    persisted: Option<&Record>,
    ctx: &DefaultContext,
    is_update: bool,
) -> String {
    let stored = persisted.and_then(|record| field.persisted(record));

    if field == FieldId::FileNumber && is_update {
        if let Some(existing) = stored {
            if draft.value(field).is_some_and(|typed| typed != existing) {
                tracing::debug!("Ignoring edit of immutable MRN {}", existing);
            }
            return existing;
        }
    }

    if let Some(typed) = draft.value(field) {
        if field.accepts(typed) {
            return typed.to_string();
        }
        tracing::warn!("Discarding invalid draft value for {}: {}", field, typed);
    }

    stored.unwrap_or_else(|| default_for(field, ctx))
}
