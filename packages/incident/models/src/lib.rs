#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident taxonomy and incident record types.
//!
//! Incidents are created by the ingestion side of the service and resolved
//! exactly once by a responder. The query engine only reads them.

use chrono::{DateTime, Utc};
use incident_map_geo_models::{GeoPoint, Located};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Unique identifier of an incident.
pub type IncidentId = uuid::Uuid;

/// Severity of an incident on a 1 (minor) to 10 (critical) scale.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Severity(u8);

impl Severity {
    /// Lowest valid severity.
    pub const MIN: Self = Self(1);
    /// Highest valid severity.
    pub const MAX: Self = Self(10);

    /// Returns the numeric value of this severity.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Creates a severity from a numeric value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-10.
    pub const fn from_value(value: u8) -> Result<Self, InvalidSeverityError> {
        if value >= Self::MIN.0 && value <= Self::MAX.0 {
            Ok(Self(value))
        } else {
            Err(InvalidSeverityError { value })
        }
    }
}

impl TryFrom<u8> for Severity {
    type Error = InvalidSeverityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity.0
    }
}

impl From<Severity> for f64 {
    fn from(severity: Severity) -> Self {
        Self::from(severity.0)
    }
}

/// Error returned when attempting to create a [`Severity`] from an invalid
/// numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSeverityError {
    /// The invalid severity value that was provided.
    pub value: u8,
}

impl std::fmt::Display for InvalidSeverityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid severity value {}: expected 1-10", self.value)
    }
}

impl std::error::Error for InvalidSeverityError {}

/// Fixed set of incident categories reported through the service.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentCategory {
    /// Nuisance behaviour affecting the community
    AntiSocialBehaviour,
    /// Theft of a bicycle
    BicycleTheft,
    /// Unlawful entry to a building
    Burglary,
    /// Vandalism and deliberate fire-setting
    CriminalDamageAndArson,
    /// Possession or supply of controlled substances
    Drugs,
    /// Offenses not covered elsewhere
    OtherCrime,
    /// Theft not covered by a more specific category
    OtherTheft,
    /// Carrying an offensive weapon
    PossessionOfWeapons,
    /// Offenses causing fear, alarm, or distress in public
    PublicOrder,
    /// Theft with force or the threat of force
    Robbery,
    /// Theft from a retail premises
    Shoplifting,
    /// Pickpocketing and snatch theft
    TheftFromThePerson,
    /// Theft of or from a vehicle
    VehicleCrime,
    /// Assault, harassment, and sexual offenses
    ViolenceAndSexualOffences,
}

impl IncidentCategory {
    /// Human-readable label, as shown in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AntiSocialBehaviour => "Anti-social behaviour",
            Self::BicycleTheft => "Bicycle theft",
            Self::Burglary => "Burglary",
            Self::CriminalDamageAndArson => "Criminal damage and arson",
            Self::Drugs => "Drugs",
            Self::OtherCrime => "Other crime",
            Self::OtherTheft => "Other theft",
            Self::PossessionOfWeapons => "Possession of weapons",
            Self::PublicOrder => "Public order",
            Self::Robbery => "Robbery",
            Self::Shoplifting => "Shoplifting",
            Self::TheftFromThePerson => "Theft from the person",
            Self::VehicleCrime => "Vehicle crime",
            Self::ViolenceAndSexualOffences => "Violence and sexual offences",
        }
    }

    /// Severity assumed when a report does not state one.
    #[must_use]
    pub const fn default_severity(self) -> Severity {
        let value = match self {
            Self::ViolenceAndSexualOffences => 9,
            Self::Robbery | Self::PossessionOfWeapons => 8,
            Self::Burglary | Self::CriminalDamageAndArson => 6,
            Self::Drugs | Self::TheftFromThePerson | Self::VehicleCrime => 5,
            Self::PublicOrder | Self::OtherCrime => 4,
            Self::BicycleTheft | Self::OtherTheft | Self::Shoplifting => 3,
            Self::AntiSocialBehaviour => 2,
        };
        Severity(value)
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::AntiSocialBehaviour,
            Self::BicycleTheft,
            Self::Burglary,
            Self::CriminalDamageAndArson,
            Self::Drugs,
            Self::OtherCrime,
            Self::OtherTheft,
            Self::PossessionOfWeapons,
            Self::PublicOrder,
            Self::Robbery,
            Self::Shoplifting,
            Self::TheftFromThePerson,
            Self::VehicleCrime,
            Self::ViolenceAndSexualOffences,
        ]
    }
}

/// Identifier of the responder who resolved an incident.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Creates an actor identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A reported incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    /// Unique incident ID.
    pub id: IncidentId,
    /// Where the incident was reported.
    pub location: GeoPoint,
    /// Incident category.
    pub category: IncidentCategory,
    /// Reported severity.
    pub severity: Severity,
    /// When the incident was reported.
    pub created_at: DateTime<Utc>,
    /// When the incident was resolved, `None` while it is still open.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Who resolved the incident, `None` while it is still open.
    pub resolved_by: Option<ActorId>,
}

impl IncidentRecord {
    /// Creates an open incident with a fresh ID.
    #[must_use]
    pub fn new(
        location: GeoPoint,
        category: IncidentCategory,
        severity: Severity,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            location,
            category,
            severity,
            created_at,
            resolved_at: None,
            resolved_by: None,
        }
    }

    /// Whether the incident has been resolved.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }

    /// Seconds between creation and resolution, `None` if unresolved.
    #[must_use]
    pub fn resolution_seconds(&self) -> Option<f64> {
        self.resolved_at
            .map(|resolved_at| duration_seconds(resolved_at - self.created_at))
    }

    /// Seconds elapsed between creation and `reference`.
    ///
    /// Negative when the incident was created after `reference`.
    #[must_use]
    pub fn age_seconds(&self, reference: DateTime<Utc>) -> f64 {
        duration_seconds(reference - self.created_at)
    }

    /// Marks the incident resolved by `actor` at `at`.
    ///
    /// # Errors
    ///
    /// * [`ResolveError::AlreadyResolved`] if the incident was already
    ///   resolved; the original resolution is left untouched.
    /// * [`ResolveError::BeforeCreation`] if `at` precedes `created_at`.
    pub fn resolve(&mut self, actor: ActorId, at: DateTime<Utc>) -> Result<(), ResolveError> {
        if self.is_resolved() {
            return Err(ResolveError::AlreadyResolved { id: self.id });
        }
        if at < self.created_at {
            return Err(ResolveError::BeforeCreation {
                id: self.id,
                created_at: self.created_at,
                resolved_at: at,
            });
        }
        self.resolved_at = Some(at);
        self.resolved_by = Some(actor);
        Ok(())
    }
}

impl Located for IncidentRecord {
    fn location(&self) -> GeoPoint {
        self.location
    }
}

/// Error returned when an incident cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    /// The incident was resolved before.
    AlreadyResolved {
        /// The incident that was already resolved.
        id: IncidentId,
    },
    /// The resolution time precedes the report time.
    BeforeCreation {
        /// The incident being resolved.
        id: IncidentId,
        /// When the incident was reported.
        created_at: DateTime<Utc>,
        /// The rejected resolution time.
        resolved_at: DateTime<Utc>,
    },
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyResolved { id } => write!(f, "incident {id} is already resolved"),
            Self::BeforeCreation {
                id,
                created_at,
                resolved_at,
            } => write!(
                f,
                "incident {id} cannot be resolved at {resolved_at}, before it was reported at {created_at}"
            ),
        }
    }
}

impl std::error::Error for ResolveError {}

#[allow(clippy::cast_precision_loss)]
fn duration_seconds(duration: chrono::TimeDelta) -> f64 {
    duration.num_milliseconds() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn incident() -> IncidentRecord {
        IncidentRecord::new(
            GeoPoint::new(51.5045, -0.0865).unwrap(),
            IncidentCategory::Robbery,
            Severity::from_value(7).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap(),
        )
    }

    #[test]
    fn severity_from_value_roundtrip() {
        for v in 1..=10u8 {
            let severity = Severity::from_value(v).unwrap();
            assert_eq!(severity.value(), v);
        }
        assert!(Severity::from_value(0).is_err());
        assert!(Severity::from_value(11).is_err());
    }

    #[test]
    fn default_severity_in_range() {
        for category in IncidentCategory::all() {
            let value = category.default_severity().value();
            assert!(
                (Severity::MIN.value()..=Severity::MAX.value()).contains(&value),
                "{category:?} default severity {value} out of range"
            );
        }
    }

    #[test]
    fn category_parses_from_wire_name() {
        let parsed: IncidentCategory = "THEFT_FROM_THE_PERSON".parse().unwrap();
        assert_eq!(parsed, IncidentCategory::TheftFromThePerson);
        assert_eq!(parsed.label(), "Theft from the person");
    }

    #[test]
    fn unresolved_has_no_duration() {
        assert!(incident().resolution_seconds().is_none());
    }

    #[test]
    fn resolves_once() {
        let mut record = incident();
        let at = record.created_at + chrono::TimeDelta::seconds(600);

        record.resolve(ActorId::from("batman"), at).unwrap();
        assert_eq!(record.resolution_seconds(), Some(600.0));
        assert_eq!(record.resolved_by, Some(ActorId::from("batman")));

        let later = at + chrono::TimeDelta::seconds(60);
        let err = record.resolve(ActorId::from("robin"), later).unwrap_err();
        assert_eq!(err, ResolveError::AlreadyResolved { id: record.id });
        assert_eq!(record.resolved_at, Some(at));
        assert_eq!(record.resolved_by, Some(ActorId::from("batman")));
    }

    #[test]
    fn rejects_resolution_before_creation() {
        let mut record = incident();
        let early = record.created_at - chrono::TimeDelta::seconds(1);

        let err = record.resolve(ActorId::from("batman"), early).unwrap_err();

        assert_eq!(
            err,
            ResolveError::BeforeCreation {
                id: record.id,
                created_at: record.created_at,
                resolved_at: early,
            }
        );
        assert!(!record.is_resolved());
        assert!(record.resolved_by.is_none());
    }

    #[test]
    fn resolution_at_creation_is_zero_seconds() {
        let mut record = incident();
        let at = record.created_at;

        record.resolve(ActorId::from("batman"), at).unwrap();

        assert_eq!(record.resolution_seconds(), Some(0.0));
    }

    #[test]
    fn age_is_relative_to_reference() {
        let record = incident();
        let reference = record.created_at + chrono::TimeDelta::minutes(5);
        assert!((record.age_seconds(reference) - 300.0).abs() < f64::EPSILON);
    }
}
