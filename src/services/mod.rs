/// Business logic services layer
use crate::domain::{
    Astronaut, AstronautDetail, AstronautInput, Mission, MissionDetail, MissionInput, Spaceship,
    SpaceshipInput,
};
use crate::errors::{ApiError, ApiResult};
use crate::repo::{self, AstronautRepo, MissionRepo, SpaceshipRepo};
use crate::validate::{
    self,
    mission::{evaluate, Candidate, CrewSchedule},
    FieldErrors,
};
use chrono::Utc;
use sqlx::PgPool;
use tracing::warn;

/// Attempts per save: the first run plus retries on serialization failure
const SAVE_ATTEMPTS: u32 = 3;

/// Astronaut record service
pub struct AstronautService {
    repo: AstronautRepo,
}

impl AstronautService {
    pub fn new(repo: AstronautRepo) -> Self {
        Self { repo }
    }

    pub async fn create(&self, input: AstronautInput) -> ApiResult<i64> {
        let normalized = validate::astronaut(&input, Utc::now().date_naive())?;
        self.repo.insert(&normalized).await
    }

    pub async fn update(&self, id: i64, input: AstronautInput) -> ApiResult<()> {
        let normalized = validate::astronaut(&input, Utc::now().date_naive())?;
        self.repo.update(id, &normalized).await
    }

    pub async fn get(&self, id: i64) -> ApiResult<AstronautDetail> {
        let astronaut = self
            .repo
            .get(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("astronaut {id}")))?;
        let age = astronaut.age(Utc::now().date_naive());
        Ok(AstronautDetail { astronaut, age })
    }

    pub async fn list(&self) -> ApiResult<Vec<Astronaut>> {
        self.repo.list().await
    }
}

/// Spaceship record service
pub struct SpaceshipService {
    repo: SpaceshipRepo,
}

impl SpaceshipService {
    pub fn new(repo: SpaceshipRepo) -> Self {
        Self { repo }
    }

    pub async fn create(&self, input: SpaceshipInput) -> ApiResult<i64> {
        let normalized = validate::spaceship(&input, Utc::now().date_naive())?;
        self.repo.insert(&normalized).await
    }

    pub async fn update(&self, id: i64, input: SpaceshipInput) -> ApiResult<()> {
        let normalized = validate::spaceship(&input, Utc::now().date_naive())?;
        self.repo.update(id, &normalized).await
    }

    pub async fn get(&self, id: i64) -> ApiResult<Spaceship> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("spaceship {id}")))
    }

    pub async fn list(&self, available_only: bool) -> ApiResult<Vec<Spaceship>> {
        self.repo.list(available_only).await
    }
}

/// Mission service: reads, plus the validate-and-save façade.
///
/// Each save runs the field validators, then one SERIALIZABLE transaction
/// that performs the conflict scans, the consistency evaluation, the
/// scalar write and the wholesale crew replacement, so two concurrent
/// saves cannot both pass validation against the same slot. Field and
/// consistency failures come back as one combined report.
pub struct MissionService {
    pool: PgPool,
    repo: MissionRepo,
}

impl MissionService {
    pub fn new(pool: PgPool, repo: MissionRepo) -> Self {
        Self { pool, repo }
    }

    pub async fn get(&self, id: i64) -> ApiResult<MissionDetail> {
        let mission = self
            .repo
            .get(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("mission {id}")))?;
        let crew = self.repo.crew(id).await?;
        let crew_count = crew.len();
        Ok(MissionDetail {
            mission,
            crew,
            crew_count,
        })
    }

    pub async fn list(&self, limit: i64, offset: i64) -> ApiResult<Vec<Mission>> {
        self.repo.list(limit, offset).await
    }

    pub async fn create(&self, input: MissionInput) -> ApiResult<i64> {
        self.save(None, input).await
    }

    pub async fn update(&self, id: i64, input: MissionInput) -> ApiResult<i64> {
        self.save(Some(id), input).await
    }

    async fn save(&self, id: Option<i64>, input: MissionInput) -> ApiResult<i64> {
        // Field failures are carried along so the consistency checks still
        // run and the submission gets one combined report
        let (normalized, field_errors) = validate::mission_fields(&input);

        let mut attempt = 1;
        loop {
            match self.try_save(id, &normalized, &field_errors).await {
                Err(err) if is_serialization_failure(&err) && attempt < SAVE_ATTEMPTS => {
                    warn!(attempt, "mission save hit a serialization conflict, retrying");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn try_save(
        &self,
        id: Option<i64>,
        input: &MissionInput,
        field_errors: &FieldErrors,
    ) -> ApiResult<i64> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        let crew_ids = match crew_source(input.crew.as_deref(), id) {
            CrewSource::Explicit(ids) => ids,
            CrewSource::Stored(mission_id) => repo::current_crew_ids(&mut *tx, mission_id).await?,
            CrewSource::Empty => Vec::new(),
        };

        let spaceship = repo::get_spaceship(&mut *tx, input.spaceship_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("spaceship {}", input.spaceship_id)))?;

        let crew = repo::astronauts_by_ids(&mut *tx, &crew_ids).await?;
        if crew.len() != crew_ids.len() {
            let found: Vec<i64> = crew.iter().map(|a| a.id).collect();
            let missing: Vec<String> = crew_ids
                .iter()
                .filter(|id| !found.contains(id))
                .map(|id| id.to_string())
                .collect();
            return Err(ApiError::NotFound(format!(
                "astronaut {}",
                missing.join(", ")
            )));
        }

        let spaceship_in_use = if input.status.requires_spaceship() {
            repo::count_active_missions_for_spaceship(&mut *tx, spaceship.id, id).await? > 0
        } else {
            false
        };

        let mut schedules = Vec::new();
        if !crew.is_empty() && input.landing_date.is_some() {
            for astronaut in &crew {
                let windows = repo::active_windows_for_astronaut(&mut *tx, astronaut.id, id).await?;
                schedules.push(CrewSchedule {
                    astronaut: astronaut.full_name(),
                    windows,
                });
            }
        }

        let candidate = Candidate {
            launch: input.launch_date,
            landing: input.landing_date,
            status: input.status,
            crew_size: crew.len(),
        };
        let errors = combine_reports(
            field_errors.clone(),
            evaluate(&candidate, &spaceship, spaceship_in_use, &schedules),
        );
        if !errors.is_empty() {
            // tx dropped here, rolling back
            return Err(ApiError::Validation(errors));
        }

        let mission_id = match id {
            None => repo::insert_mission(&mut *tx, input).await?,
            Some(mission_id) => {
                repo::update_mission(&mut *tx, mission_id, input).await?;
                mission_id
            }
        };
        repo::replace_crew(&mut *tx, mission_id, &crew_ids).await?;

        tx.commit().await?;
        Ok(mission_id)
    }
}

/// Where a save takes its crew set from: an explicit list always wins, an
/// omitted crew on update keeps the stored assignments, and an omitted
/// crew on create means no crew
#[derive(Debug, PartialEq, Eq)]
enum CrewSource {
    Explicit(Vec<i64>),
    Stored(i64),
    Empty,
}

fn crew_source(explicit: Option<&[i64]>, mission_id: Option<i64>) -> CrewSource {
    match (explicit, mission_id) {
        (Some(ids), _) => CrewSource::Explicit(dedup_ids(ids)),
        (None, Some(mission_id)) => CrewSource::Stored(mission_id),
        (None, None) => CrewSource::Empty,
    }
}

/// Field-scoped failures from the scalar pass, then the consistency pass
fn combine_reports(mut field_errors: FieldErrors, consistency: FieldErrors) -> FieldErrors {
    field_errors.append(consistency);
    field_errors
}

fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    let mut out = Vec::with_capacity(ids.len());
    for &id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

/// Postgres reports SQLSTATE 40001 when a SERIALIZABLE transaction loses
fn is_serialization_failure(err: &ApiError) -> bool {
    if let ApiError::Database(sqlx::Error::Database(db)) = err {
        return db.code().as_deref() == Some("40001");
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MissionStatus, Spaceship};
    use chrono::{DateTime, TimeZone, Utc};

    #[test]
    fn test_dedup_ids_preserves_order() {
        assert_eq!(dedup_ids(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(dedup_ids(&[]).is_empty());
    }

    #[test]
    fn test_crew_source_explicit_wins() {
        assert_eq!(
            crew_source(Some(&[2, 1, 2]), Some(7)),
            CrewSource::Explicit(vec![2, 1])
        );
        assert_eq!(
            crew_source(Some(&[5]), None),
            CrewSource::Explicit(vec![5])
        );
        // explicit empty list clears the crew, it does not fall back
        assert_eq!(
            crew_source(Some(&[]), Some(7)),
            CrewSource::Explicit(vec![])
        );
    }

    #[test]
    fn test_crew_source_omitted_on_update_keeps_stored() {
        assert_eq!(crew_source(None, Some(7)), CrewSource::Stored(7));
    }

    #[test]
    fn test_crew_source_omitted_on_create_is_empty() {
        assert_eq!(crew_source(None, None), CrewSource::Empty);
    }

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, hour, 0, 0).unwrap()
    }

    // A submission with a malformed scalar field and an inverted schedule
    // reports both failures at once
    #[test]
    fn test_field_and_consistency_failures_report_together() {
        let input = crate::domain::MissionInput {
            name: "Mars Express".into(),
            spaceship_id: 1,
            crew: None,
            launch_date: t(10),
            landing_date: Some(t(5)),
            status: MissionStatus::Planned,
            destination: "X1".into(),
        };
        let (normalized, field_errors) = validate::mission_fields(&input);
        assert_eq!(field_errors.len(), 1);

        let spaceship = Spaceship {
            id: 1,
            name: "Voskhod".into(),
            manufacturer: "OKB-1".into(),
            launch_date: chrono::NaiveDate::from_ymd_opt(1964, 10, 12).unwrap(),
            capacity: 4,
            mass: 5.3,
            is_available: true,
        };
        let candidate = Candidate {
            launch: normalized.launch_date,
            landing: normalized.landing_date,
            status: normalized.status,
            crew_size: 0,
        };
        let schedules: Vec<CrewSchedule> = Vec::new();
        let combined = combine_reports(
            field_errors,
            evaluate(&candidate, &spaceship, false, &schedules),
        );

        let fields: Vec<_> = combined.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["destination", "landing_date"]);
    }
}
