//! Historical resolution-time estimates.

use incident_map_incident_models::{ActorId, IncidentCategory, IncidentRecord};

/// Mean time, in minutes, that `actor` has taken to resolve incidents of
/// `category`.
///
/// Only records resolved by `actor` in `category` count. Records without a
/// resolution time are skipped rather than counted as zero. So are records
/// whose resolution predates their creation: `IncidentRecord::resolve`
/// refuses to produce them, but records loaded through serde or built by
/// hand can still carry a negative duration. Returns `None` when no record
/// qualifies.
pub fn estimate_resolution_minutes<'a>(
    actor: &ActorId,
    category: IncidentCategory,
    history: impl IntoIterator<Item = &'a IncidentRecord>,
) -> Option<f64> {
    let mut total_seconds = 0.0;
    let mut count = 0_u32;

    for record in history {
        if record.category != category || record.resolved_by.as_ref() != Some(actor) {
            continue;
        }
        let Some(seconds) = record.resolution_seconds() else {
            continue;
        };
        if !seconds.is_finite() || seconds < 0.0 {
            log::trace!(
                "Skipping incident {} with unusable resolution time {seconds}s",
                record.id
            );
            continue;
        }
        total_seconds += seconds;
        count += 1;
    }

    if count == 0 {
        log::trace!("No resolution history for {actor} on {category}");
        return None;
    }

    Some(total_seconds / f64::from(count) / 60.0)
}

/// Estimate for how long `actor` would take to resolve `incident`, using
/// only history that was already known when the incident was reported.
///
/// The incident itself and any record resolved after `incident.created_at`
/// are excluded.
pub fn estimate_for_incident<'a>(
    incident: &IncidentRecord,
    actor: &ActorId,
    history: impl IntoIterator<Item = &'a IncidentRecord>,
) -> Option<f64> {
    let prior = history.into_iter().filter(|record| {
        record.id != incident.id
            && record
                .resolved_at
                .is_some_and(|resolved_at| resolved_at <= incident.created_at)
    });
    estimate_resolution_minutes(actor, incident.category, prior)
}
