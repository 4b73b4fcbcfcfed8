/// Domain models for the mission registry
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Astronaut record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Astronaut {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub nationality: String,
}

impl Astronaut {
    /// Display name, `last_name first_name`
    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }

    /// Age in whole years as of `today`
    pub fn age(&self, today: NaiveDate) -> i32 {
        crate::validate::age_on(self.birth_date, today)
    }
}

/// Spaceship record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spaceship {
    pub id: i64,
    pub name: String,
    pub manufacturer: String,
    pub launch_date: NaiveDate,
    pub capacity: i32,
    pub mass: f64,
    pub is_available: bool,
}

/// Mission lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionStatus {
    Planned,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl MissionStatus {
    /// Canonical text form, also the stored representation
    pub fn as_str(self) -> &'static str {
        match self {
            MissionStatus::Planned => "Planned",
            MissionStatus::InProgress => "InProgress",
            MissionStatus::Completed => "Completed",
            MissionStatus::Failed => "Failed",
            MissionStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Planned" => Some(MissionStatus::Planned),
            "InProgress" => Some(MissionStatus::InProgress),
            "Completed" => Some(MissionStatus::Completed),
            "Failed" => Some(MissionStatus::Failed),
            "Cancelled" => Some(MissionStatus::Cancelled),
            _ => None,
        }
    }

    /// Statuses that occupy a spaceship or an astronaut's schedule
    pub fn is_active(self) -> bool {
        matches!(self, MissionStatus::Planned | MissionStatus::InProgress)
    }

    /// Availability and exclusivity apply once a mission has left the
    /// Planned stage and has not been Cancelled
    pub fn requires_spaceship(self) -> bool {
        !matches!(self, MissionStatus::Planned | MissionStatus::Cancelled)
    }
}

/// Mission record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub id: i64,
    pub name: String,
    pub spaceship_id: i64,
    pub launch_date: DateTime<Utc>,
    pub landing_date: Option<DateTime<Utc>>,
    pub status: MissionStatus,
    pub destination: String,
}

/// Mission with its crew resolved, for detail views
#[derive(Debug, Serialize)]
pub struct MissionDetail {
    #[serde(flatten)]
    pub mission: Mission,
    pub crew: Vec<Astronaut>,
    pub crew_count: usize,
}

/// Astronaut with derived age, for detail views
#[derive(Debug, Serialize)]
pub struct AstronautDetail {
    #[serde(flatten)]
    pub astronaut: Astronaut,
    pub age: i32,
}

/// Incoming astronaut payload, unvalidated
#[derive(Debug, Clone, Deserialize)]
pub struct AstronautInput {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub nationality: String,
}

/// Incoming spaceship payload, unvalidated
#[derive(Debug, Clone, Deserialize)]
pub struct SpaceshipInput {
    pub name: String,
    pub manufacturer: String,
    pub launch_date: NaiveDate,
    #[serde(default)]
    pub capacity: i32,
    pub mass: f64,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

/// Incoming mission payload, unvalidated.
///
/// `crew` left out on update means "keep the stored crew"; an explicit
/// empty list clears it.
#[derive(Debug, Clone, Deserialize)]
pub struct MissionInput {
    pub name: String,
    pub spaceship_id: i64,
    pub crew: Option<Vec<i64>>,
    pub launch_date: DateTime<Utc>,
    pub landing_date: Option<DateTime<Utc>>,
    #[serde(default = "default_status")]
    pub status: MissionStatus,
    pub destination: String,
}

fn default_status() -> MissionStatus {
    MissionStatus::Planned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            MissionStatus::Planned,
            MissionStatus::InProgress,
            MissionStatus::Completed,
            MissionStatus::Failed,
            MissionStatus::Cancelled,
        ] {
            assert_eq!(MissionStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_status_parse_unknown() {
        assert_eq!(MissionStatus::parse("Scrubbed"), None);
        assert_eq!(MissionStatus::parse(""), None);
    }

    #[test]
    fn test_active_statuses() {
        assert!(MissionStatus::Planned.is_active());
        assert!(MissionStatus::InProgress.is_active());
        assert!(!MissionStatus::Completed.is_active());
        assert!(!MissionStatus::Failed.is_active());
        assert!(!MissionStatus::Cancelled.is_active());
    }

    #[test]
    fn test_exclusivity_gate() {
        assert!(!MissionStatus::Planned.requires_spaceship());
        assert!(!MissionStatus::Cancelled.requires_spaceship());
        assert!(MissionStatus::InProgress.requires_spaceship());
        assert!(MissionStatus::Completed.requires_spaceship());
        assert!(MissionStatus::Failed.requires_spaceship());
    }

    #[test]
    fn test_full_name_order() {
        let a = Astronaut {
            id: 1,
            first_name: "Yuri".into(),
            last_name: "Gagarin".into(),
            birth_date: NaiveDate::from_ymd_opt(1934, 3, 9).unwrap(),
            nationality: "Soviet".into(),
        };
        assert_eq!(a.full_name(), "Gagarin Yuri");
    }
}
