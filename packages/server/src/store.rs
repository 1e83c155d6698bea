//! In-memory incident log.
//!
//! Incidents are kept in creation-time order and only ever appended or
//! resolved. Readers take point-in-time clones, so query code never holds
//! the lock while it runs.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use incident_map_incident_models::{ActorId, IncidentId, IncidentRecord, ResolveError};

/// Errors from incident mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No incident with this ID exists.
    #[error("Incident {id} not found")]
    NotFound {
        /// Requested incident.
        id: IncidentId,
    },

    /// The incident was resolved before.
    #[error("Incident {id} is already resolved")]
    AlreadyResolved {
        /// Requested incident.
        id: IncidentId,
    },

    /// The resolution time precedes the report time.
    #[error("Incident {id} cannot be resolved before it was reported")]
    BeforeCreation {
        /// Requested incident.
        id: IncidentId,
    },
}

impl From<ResolveError> for StoreError {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::AlreadyResolved { id } => Self::AlreadyResolved { id },
            ResolveError::BeforeCreation { id, .. } => Self::BeforeCreation { id },
        }
    }
}

/// Append-only, creation-ordered incident log.
#[derive(Debug, Default)]
pub struct IncidentStore {
    incidents: RwLock<Vec<IncidentRecord>>,
}

impl IncidentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `records`, in creation order.
    #[must_use]
    pub fn with_records(mut records: Vec<IncidentRecord>) -> Self {
        records.sort_by_key(|record| record.created_at);
        Self {
            incidents: RwLock::new(records),
        }
    }

    /// Appends an incident, keeping creation order, and returns its ID.
    pub fn insert(&self, record: IncidentRecord) -> IncidentId {
        let id = record.id;
        let mut incidents = self.write();
        let position = incidents.partition_point(|existing| existing.created_at <= record.created_at);
        incidents.insert(position, record);
        id
    }

    /// Number of stored incidents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Point-in-time copy of every incident.
    #[must_use]
    pub fn snapshot(&self) -> Vec<IncidentRecord> {
        self.read().clone()
    }

    /// Point-in-time copy of incidents created at or after `cutoff`.
    #[must_use]
    pub fn created_since(&self, cutoff: DateTime<Utc>) -> Vec<IncidentRecord> {
        let incidents = self.read();
        let start = incidents.partition_point(|record| record.created_at < cutoff);
        incidents[start..].to_vec()
    }

    /// Marks an incident resolved by `actor` at `at` and returns the updated
    /// record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown ID,
    /// [`StoreError::AlreadyResolved`] if the incident was resolved before,
    /// and [`StoreError::BeforeCreation`] if `at` precedes its report time.
    pub fn resolve(
        &self,
        id: IncidentId,
        actor: ActorId,
        at: DateTime<Utc>,
    ) -> Result<IncidentRecord, StoreError> {
        let mut incidents = self.write();
        let record = incidents
            .iter_mut()
            .rev()
            .find(|record| record.id == id)
            .ok_or(StoreError::NotFound { id })?;

        record.resolve(actor, at)?;

        log::debug!("Incident {id} resolved");
        Ok(record.clone())
    }

    // Writers never leave the log half-updated, so a poisoned lock still
    // guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, Vec<IncidentRecord>> {
        self.incidents.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<IncidentRecord>> {
        self.incidents.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone as _};
    use incident_map_geo_models::GeoPoint;
    use incident_map_incident_models::{IncidentCategory, Severity};

    use super::*;

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap() + TimeDelta::minutes(minute)
    }

    fn incident(minute: i64) -> IncidentRecord {
        IncidentRecord::new(
            GeoPoint::new(51.5, -0.1).unwrap(),
            IncidentCategory::Shoplifting,
            Severity::from_value(3).unwrap(),
            at(minute),
        )
    }

    #[test]
    fn keeps_creation_order() {
        let store = IncidentStore::new();
        store.insert(incident(10));
        store.insert(incident(0));
        store.insert(incident(5));

        let minutes: Vec<DateTime<Utc>> =
            store.snapshot().iter().map(|r| r.created_at).collect();
        assert_eq!(minutes, vec![at(0), at(5), at(10)]);
    }

    #[test]
    fn created_since_is_inclusive() {
        let store = IncidentStore::with_records(vec![incident(0), incident(5), incident(10)]);

        let recent = store.created_since(at(5));

        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].created_at, at(5));
    }

    #[test]
    fn resolves_exactly_once() {
        let store = IncidentStore::new();
        let id = store.insert(incident(0));

        let resolved = store.resolve(id, ActorId::from("batman"), at(10)).unwrap();
        assert_eq!(resolved.resolved_at, Some(at(10)));

        assert_eq!(
            store.resolve(id, ActorId::from("robin"), at(11)),
            Err(StoreError::AlreadyResolved { id })
        );
        assert_eq!(
            store.snapshot()[0].resolved_by,
            Some(ActorId::from("batman"))
        );
    }

    #[test]
    fn rejects_resolution_before_creation() {
        let store = IncidentStore::new();
        let id = store.insert(incident(10));

        assert_eq!(
            store.resolve(id, ActorId::from("batman"), at(5)),
            Err(StoreError::BeforeCreation { id })
        );
        assert!(!store.snapshot()[0].is_resolved());
    }

    #[test]
    fn resolving_unknown_incident_fails() {
        let store = IncidentStore::new();
        let id = uuid::Uuid::new_v4();

        assert_eq!(
            store.resolve(id, ActorId::from("batman"), at(0)),
            Err(StoreError::NotFound { id })
        );
    }
}
