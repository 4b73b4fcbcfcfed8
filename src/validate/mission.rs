/// Mission consistency rules: cross-field and cross-entity checks applied
/// whenever a mission is created or edited.
///
/// The service layer gathers facts (spaceship row, conflict scans) inside
/// the save transaction and calls [`evaluate`], which is pure so every rule
/// can be exercised without a database. All applicable checks run; failures
/// are collected, never short-circuited.
use super::{FieldError, FieldErrors, ValidationKind};
use crate::domain::{MissionStatus, Spaceship};
use chrono::{DateTime, Utc};

/// The mission being created or edited, after field validation
#[derive(Debug, Clone)]
pub struct Candidate {
    pub launch: DateTime<Utc>,
    pub landing: Option<DateTime<Utc>>,
    pub status: MissionStatus,
    pub crew_size: usize,
}

/// Occupied `[launch, landing)` slot from another active mission
#[derive(Debug, Clone, Copy)]
pub struct MissionWindow {
    pub launch: DateTime<Utc>,
    pub landing: Option<DateTime<Utc>>,
}

/// One crew member's other active missions, as gathered for the candidate
#[derive(Debug, Clone)]
pub struct CrewSchedule {
    pub astronaut: String,
    pub windows: Vec<MissionWindow>,
}

/// Half-open overlap test: a window ending exactly when the candidate
/// starts (or starting exactly when it ends) does not conflict. Open-ended
/// windows (no landing) never conflict.
pub fn overlaps(window: MissionWindow, launch: DateTime<Utc>, landing: DateTime<Utc>) -> bool {
    match window.landing {
        Some(window_landing) => window.launch < landing && window_landing > launch,
        None => false,
    }
}

/// Run every consistency check against the gathered facts.
///
/// `spaceship_in_use` reflects whether any other mission with status in
/// {Planned, InProgress} references the same spaceship, the candidate's own
/// record excluded.
pub fn evaluate(
    candidate: &Candidate,
    spaceship: &Spaceship,
    spaceship_in_use: bool,
    crew: &[CrewSchedule],
) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if let Some(landing) = candidate.landing {
        if landing <= candidate.launch {
            errors.push(FieldError::new(
                "landing_date",
                ValidationKind::ScheduleConflict,
                "landing date must be after the launch date",
            ));
        }
    }

    if candidate.status.requires_spaceship() {
        if !spaceship.is_available {
            errors.push(FieldError::new(
                "spaceship",
                ValidationKind::ResourceConflict,
                "the spaceship must be available to fly this mission",
            ));
        }
        if spaceship_in_use {
            errors.push(FieldError::new(
                "spaceship",
                ValidationKind::ResourceConflict,
                "this spaceship is already assigned to another active mission",
            ));
        }
    }

    if candidate.crew_size > 0 && candidate.crew_size as i64 > i64::from(spaceship.capacity) {
        errors.push(FieldError::new(
            "crew",
            ValidationKind::CapacityExceeded,
            format!(
                "the spaceship fits only {} crew members, {} selected",
                spaceship.capacity, candidate.crew_size
            ),
        ));
    }

    if candidate.crew_size > 0 {
        if let Some(landing) = candidate.landing {
            for schedule in crew {
                let conflict = schedule
                    .windows
                    .iter()
                    .any(|w| overlaps(*w, candidate.launch, landing));
                if conflict {
                    errors.push(FieldError::new(
                        "crew",
                        ValidationKind::ScheduleConflict,
                        format!(
                            "astronaut {} is already on another mission in this period",
                            schedule.astronaut
                        ),
                    ));
                }
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, hour, 0, 0).unwrap()
    }

    fn ship(capacity: i32, is_available: bool) -> Spaceship {
        Spaceship {
            id: 1,
            name: "Voskhod".into(),
            manufacturer: "OKB-1".into(),
            launch_date: chrono::NaiveDate::from_ymd_opt(1964, 10, 12).unwrap(),
            capacity,
            mass: 5.3,
            is_available,
        }
    }

    fn candidate(
        launch: DateTime<Utc>,
        landing: Option<DateTime<Utc>>,
        status: MissionStatus,
        crew_size: usize,
    ) -> Candidate {
        Candidate {
            launch,
            landing,
            status,
            crew_size,
        }
    }

    fn kinds(errors: &FieldErrors) -> Vec<(&'static str, ValidationKind)> {
        errors.iter().map(|e| (e.field, e.kind)).collect()
    }

    #[test]
    fn test_accepts_clean_candidate() {
        let c = candidate(t(0), Some(t(10)), MissionStatus::Planned, 2);
        let errors = evaluate(&c, &ship(4, true), false, &[]);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_landing_equal_to_launch_rejected() {
        let c = candidate(t(5), Some(t(5)), MissionStatus::Planned, 0);
        let errors = evaluate(&c, &ship(4, true), false, &[]);
        assert_eq!(
            kinds(&errors),
            vec![("landing_date", ValidationKind::ScheduleConflict)]
        );
    }

    #[test]
    fn test_landing_one_tick_after_launch_accepted() {
        let launch = t(5);
        let landing = launch + chrono::Duration::seconds(1);
        let c = candidate(launch, Some(landing), MissionStatus::Planned, 0);
        assert!(evaluate(&c, &ship(4, true), false, &[]).is_empty());
    }

    #[test]
    fn test_open_ended_mission_skips_schedule_check() {
        let c = candidate(t(5), None, MissionStatus::Planned, 0);
        assert!(evaluate(&c, &ship(4, true), false, &[]).is_empty());
    }

    // Scenario: crew of 5 on a 4-seat ship
    #[test]
    fn test_capacity_exceeded() {
        let c = candidate(t(0), Some(t(10)), MissionStatus::Planned, 5);
        let errors = evaluate(&c, &ship(4, true), false, &[]);
        assert_eq!(kinds(&errors), vec![("crew", ValidationKind::CapacityExceeded)]);
        let msg = &errors.iter().next().unwrap().message;
        assert!(msg.contains('4') && msg.contains('5'));
    }

    #[test]
    fn test_capacity_check_skipped_for_empty_crew() {
        let c = candidate(t(0), Some(t(10)), MissionStatus::Planned, 0);
        assert!(evaluate(&c, &ship(0, true), false, &[]).is_empty());
    }

    // Scenario: spaceship already flying another active mission
    #[test]
    fn test_spaceship_exclusivity_conflict() {
        let c = candidate(t(1), Some(t(5)), MissionStatus::InProgress, 0);
        let errors = evaluate(&c, &ship(4, true), true, &[]);
        assert_eq!(
            kinds(&errors),
            vec![("spaceship", ValidationKind::ResourceConflict)]
        );
    }

    #[test]
    fn test_unavailable_spaceship_rejected_when_flying() {
        let c = candidate(t(0), Some(t(10)), MissionStatus::InProgress, 0);
        let errors = evaluate(&c, &ship(4, false), false, &[]);
        assert_eq!(
            kinds(&errors),
            vec![("spaceship", ValidationKind::ResourceConflict)]
        );
    }

    #[test]
    fn test_planned_and_cancelled_skip_spaceship_checks() {
        for status in [MissionStatus::Planned, MissionStatus::Cancelled] {
            let c = candidate(t(0), Some(t(10)), status, 0);
            assert!(evaluate(&c, &ship(4, false), true, &[]).is_empty());
        }
    }

    #[test]
    fn test_completed_status_still_checks_spaceship() {
        let c = candidate(t(0), Some(t(10)), MissionStatus::Completed, 0);
        let errors = evaluate(&c, &ship(4, false), false, &[]);
        assert_eq!(
            kinds(&errors),
            vec![("spaceship", ValidationKind::ResourceConflict)]
        );
    }

    // Scenario: astronaut already on an overlapping mission
    #[test]
    fn test_crew_overlap_names_astronaut() {
        let schedules = vec![CrewSchedule {
            astronaut: "Leonov Alexei".into(),
            windows: vec![MissionWindow {
                launch: t(0),
                landing: Some(t(10)),
            }],
        }];
        let c = candidate(t(5), Some(t(15)), MissionStatus::Planned, 1);
        let errors = evaluate(&c, &ship(4, true), false, &schedules);
        assert_eq!(kinds(&errors), vec![("crew", ValidationKind::ScheduleConflict)]);
        assert!(errors
            .iter()
            .next()
            .unwrap()
            .message
            .contains("Leonov Alexei"));
    }

    // Scenario: back-to-back missions on a half-open interval
    #[test]
    fn test_back_to_back_missions_do_not_conflict() {
        let schedules = vec![CrewSchedule {
            astronaut: "Leonov Alexei".into(),
            windows: vec![MissionWindow {
                launch: t(0),
                landing: Some(t(10)),
            }],
        }];
        let c = candidate(t(10), Some(t(20)), MissionStatus::Planned, 1);
        assert!(evaluate(&c, &ship(4, true), false, &schedules).is_empty());
    }

    #[test]
    fn test_open_ended_existing_mission_does_not_conflict() {
        let window = MissionWindow {
            launch: t(0),
            landing: None,
        };
        assert!(!overlaps(window, t(1), t(5)));
    }

    #[test]
    fn test_overlap_predicate_boundaries() {
        let window = MissionWindow {
            launch: t(5),
            landing: Some(t(10)),
        };
        assert!(!overlaps(window, t(0), t(5))); // candidate ends as window starts
        assert!(!overlaps(window, t(10), t(20))); // candidate starts as window ends
        assert!(overlaps(window, t(0), t(6)));
        assert!(overlaps(window, t(9), t(20)));
        assert!(overlaps(window, t(6), t(9))); // contained
        assert!(overlaps(window, t(0), t(20))); // containing
    }

    #[test]
    fn test_candidate_without_landing_skips_crew_overlap() {
        let schedules = vec![CrewSchedule {
            astronaut: "Leonov Alexei".into(),
            windows: vec![MissionWindow {
                launch: t(0),
                landing: Some(t(10)),
            }],
        }];
        let c = candidate(t(5), None, MissionStatus::Planned, 1);
        assert!(evaluate(&c, &ship(4, true), false, &schedules).is_empty());
    }

    // All checks run even when the schedule check already failed
    #[test]
    fn test_failures_accumulate_without_short_circuit() {
        let schedules = vec![CrewSchedule {
            astronaut: "Leonov Alexei".into(),
            windows: vec![MissionWindow {
                // candidate interval is inverted, so no overlap hit here;
                // capacity and spaceship failures still surface together
                launch: t(20),
                landing: Some(t(22)),
            }],
        }];
        let c = candidate(t(10), Some(t(5)), MissionStatus::InProgress, 3);
        let errors = evaluate(&c, &ship(2, false), true, &schedules);
        assert_eq!(
            kinds(&errors),
            vec![
                ("landing_date", ValidationKind::ScheduleConflict),
                ("spaceship", ValidationKind::ResourceConflict),
                ("spaceship", ValidationKind::ResourceConflict),
                ("crew", ValidationKind::CapacityExceeded),
            ]
        );
    }

    // Exclusion-by-id is the gatherer's job; with its own record excluded a
    // re-validated mission sees no conflicts
    #[test]
    fn test_revalidation_with_own_record_excluded_passes() {
        let c = candidate(t(0), Some(t(10)), MissionStatus::InProgress, 2);
        let errors = evaluate(&c, &ship(4, true), false, &[]);
        assert!(errors.is_empty());
    }
}
