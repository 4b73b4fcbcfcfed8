/// Repository layer for database operations
use crate::domain::{Astronaut, AstronautInput, Mission, MissionInput, MissionStatus, Spaceship, SpaceshipInput};
use crate::errors::{ApiError, ApiResult};
use crate::validate::mission::MissionWindow;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgExecutor, PgPool};

type MissionRow = (
    i64,
    String,
    i64,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
    String,
    String,
);

fn map_mission(row: MissionRow) -> ApiResult<Mission> {
    let (id, name, spaceship_id, launch_date, landing_date, status, destination) = row;
    let status = MissionStatus::parse(&status)
        .ok_or_else(|| ApiError::Internal(format!("unknown mission status in store: {status}")))?;
    Ok(Mission {
        id,
        name,
        spaceship_id,
        launch_date,
        landing_date,
        status,
        destination,
    })
}

fn active_status_names() -> Vec<String> {
    [MissionStatus::Planned, MissionStatus::InProgress]
        .iter()
        .map(|s| s.as_str().to_string())
        .collect()
}

/// Astronaut repository
#[derive(Clone)]
pub struct AstronautRepo {
    pool: PgPool,
}

impl AstronautRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, input: &AstronautInput) -> ApiResult<i64> {
        let (id,) = sqlx::query_as::<_, (i64,)>(
            "INSERT INTO astronauts (first_name, last_name, birth_date, nationality)
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(input.birth_date)
        .bind(&input.nationality)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn update(&self, id: i64, input: &AstronautInput) -> ApiResult<()> {
        let result = sqlx::query(
            "UPDATE astronauts
             SET first_name = $2, last_name = $3, birth_date = $4, nationality = $5
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(input.birth_date)
        .bind(&input.nationality)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("astronaut {id}")));
        }
        Ok(())
    }

    pub async fn get(&self, id: i64) -> ApiResult<Option<Astronaut>> {
        let row = sqlx::query_as::<_, (i64, String, String, NaiveDate, String)>(
            "SELECT id, first_name, last_name, birth_date, nationality
             FROM astronauts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(id, first_name, last_name, birth_date, nationality)| Astronaut {
                id,
                first_name,
                last_name,
                birth_date,
                nationality,
            },
        ))
    }

    pub async fn list(&self) -> ApiResult<Vec<Astronaut>> {
        let rows = sqlx::query_as::<_, (i64, String, String, NaiveDate, String)>(
            "SELECT id, first_name, last_name, birth_date, nationality
             FROM astronauts ORDER BY last_name, first_name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, first_name, last_name, birth_date, nationality)| Astronaut {
                    id,
                    first_name,
                    last_name,
                    birth_date,
                    nationality,
                },
            )
            .collect())
    }
}

/// Spaceship repository
#[derive(Clone)]
pub struct SpaceshipRepo {
    pool: PgPool,
}

impl SpaceshipRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, input: &SpaceshipInput) -> ApiResult<i64> {
        let (id,) = sqlx::query_as::<_, (i64,)>(
            "INSERT INTO spaceships (name, manufacturer, launch_date, capacity, mass, is_available)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(&input.name)
        .bind(&input.manufacturer)
        .bind(input.launch_date)
        .bind(input.capacity)
        .bind(input.mass)
        .bind(input.is_available)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn update(&self, id: i64, input: &SpaceshipInput) -> ApiResult<()> {
        let result = sqlx::query(
            "UPDATE spaceships
             SET name = $2, manufacturer = $3, launch_date = $4,
                 capacity = $5, mass = $6, is_available = $7
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.manufacturer)
        .bind(input.launch_date)
        .bind(input.capacity)
        .bind(input.mass)
        .bind(input.is_available)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("spaceship {id}")));
        }
        Ok(())
    }

    pub async fn get(&self, id: i64) -> ApiResult<Option<Spaceship>> {
        get_spaceship(&self.pool, id).await
    }

    /// All spaceships, or only the ones flagged available. The filtered
    /// variant backs the edit form's choice list and is advisory only;
    /// the consistency validator re-checks availability at save time.
    pub async fn list(&self, available_only: bool) -> ApiResult<Vec<Spaceship>> {
        let sql = if available_only {
            "SELECT id, name, manufacturer, launch_date, capacity, mass, is_available
             FROM spaceships WHERE is_available ORDER BY name"
        } else {
            "SELECT id, name, manufacturer, launch_date, capacity, mass, is_available
             FROM spaceships ORDER BY name"
        };
        let rows = sqlx::query_as::<_, (i64, String, String, NaiveDate, i32, f64, bool)>(sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, name, manufacturer, launch_date, capacity, mass, is_available)| Spaceship {
                    id,
                    name,
                    manufacturer,
                    launch_date,
                    capacity,
                    mass,
                    is_available,
                },
            )
            .collect())
    }
}

/// Mission repository (reads outside the save transaction)
#[derive(Clone)]
pub struct MissionRepo {
    pool: PgPool,
}

impl MissionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> ApiResult<Option<Mission>> {
        let row = sqlx::query_as::<_, MissionRow>(
            "SELECT id, name, spaceship_id, launch_date, landing_date, status, destination
             FROM missions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(map_mission).transpose()
    }

    pub async fn list(&self, limit: i64, offset: i64) -> ApiResult<Vec<Mission>> {
        let rows = sqlx::query_as::<_, MissionRow>(
            "SELECT id, name, spaceship_id, launch_date, landing_date, status, destination
             FROM missions ORDER BY launch_date DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(map_mission).collect()
    }

    /// Crew of a mission, in roster order
    pub async fn crew(&self, mission_id: i64) -> ApiResult<Vec<Astronaut>> {
        let rows = sqlx::query_as::<_, (i64, String, String, NaiveDate, String)>(
            "SELECT a.id, a.first_name, a.last_name, a.birth_date, a.nationality
             FROM astronauts a
             JOIN mission_crew mc ON mc.astronaut_id = a.id
             WHERE mc.mission_id = $1
             ORDER BY a.last_name, a.first_name",
        )
        .bind(mission_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, first_name, last_name, birth_date, nationality)| Astronaut {
                    id,
                    first_name,
                    last_name,
                    birth_date,
                    nationality,
                },
            )
            .collect())
    }
}

/// Spaceship lookup usable both from the pool and inside a transaction
pub async fn get_spaceship<'e, E: PgExecutor<'e>>(
    exec: E,
    id: i64,
) -> ApiResult<Option<Spaceship>> {
    let row = sqlx::query_as::<_, (i64, String, String, NaiveDate, i32, f64, bool)>(
        "SELECT id, name, manufacturer, launch_date, capacity, mass, is_available
         FROM spaceships WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(exec)
    .await?;

    Ok(row.map(
        |(id, name, manufacturer, launch_date, capacity, mass, is_available)| Spaceship {
            id,
            name,
            manufacturer,
            launch_date,
            capacity,
            mass,
            is_available,
        },
    ))
}

/// Astronauts by id, in the order the store returns them
pub async fn astronauts_by_ids<'e, E: PgExecutor<'e>>(
    exec: E,
    ids: &[i64],
) -> ApiResult<Vec<Astronaut>> {
    let rows = sqlx::query_as::<_, (i64, String, String, NaiveDate, String)>(
        "SELECT id, first_name, last_name, birth_date, nationality
         FROM astronauts WHERE id = ANY($1)
         ORDER BY last_name, first_name",
    )
    .bind(ids)
    .fetch_all(exec)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(id, first_name, last_name, birth_date, nationality)| Astronaut {
                id,
                first_name,
                last_name,
                birth_date,
                nationality,
            },
        )
        .collect())
}

/// Stored crew assignment ids for a mission
pub async fn current_crew_ids<'e, E: PgExecutor<'e>>(
    exec: E,
    mission_id: i64,
) -> ApiResult<Vec<i64>> {
    let rows = sqlx::query_as::<_, (i64,)>(
        "SELECT astronaut_id FROM mission_crew WHERE mission_id = $1 ORDER BY astronaut_id",
    )
    .bind(mission_id)
    .fetch_all(exec)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// How many other missions with status in {Planned, InProgress} reference
/// this spaceship, the candidate's own record excluded
pub async fn count_active_missions_for_spaceship<'e, E: PgExecutor<'e>>(
    exec: E,
    spaceship_id: i64,
    exclude_id: Option<i64>,
) -> ApiResult<i64> {
    let (count,) = sqlx::query_as::<_, (i64,)>(
        "SELECT count(*) FROM missions
         WHERE spaceship_id = $1
           AND status = ANY($2)
           AND ($3::bigint IS NULL OR id <> $3)",
    )
    .bind(spaceship_id)
    .bind(active_status_names())
    .bind(exclude_id)
    .fetch_one(exec)
    .await?;
    Ok(count)
}

/// `[launch, landing)` windows of the astronaut's other active missions.
/// Open-ended missions are left out; the overlap predicate itself is
/// applied by the consistency validator.
pub async fn active_windows_for_astronaut<'e, E: PgExecutor<'e>>(
    exec: E,
    astronaut_id: i64,
    exclude_id: Option<i64>,
) -> ApiResult<Vec<MissionWindow>> {
    let rows = sqlx::query_as::<_, (DateTime<Utc>, DateTime<Utc>)>(
        "SELECT m.launch_date, m.landing_date
         FROM missions m
         JOIN mission_crew mc ON mc.mission_id = m.id
         WHERE mc.astronaut_id = $1
           AND m.status = ANY($2)
           AND m.landing_date IS NOT NULL
           AND ($3::bigint IS NULL OR m.id <> $3)",
    )
    .bind(astronaut_id)
    .bind(active_status_names())
    .bind(exclude_id)
    .fetch_all(exec)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(launch, landing)| MissionWindow {
            launch,
            landing: Some(landing),
        })
        .collect())
}

/// Insert the mission's scalar row, returning the new id
pub async fn insert_mission<'e, E: PgExecutor<'e>>(
    exec: E,
    input: &MissionInput,
) -> ApiResult<i64> {
    let (id,) = sqlx::query_as::<_, (i64,)>(
        "INSERT INTO missions (name, spaceship_id, launch_date, landing_date, status, destination)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(&input.name)
    .bind(input.spaceship_id)
    .bind(input.launch_date)
    .bind(input.landing_date)
    .bind(input.status.as_str())
    .bind(&input.destination)
    .fetch_one(exec)
    .await?;
    Ok(id)
}

/// Update the mission's scalar row
pub async fn update_mission<'e, E: PgExecutor<'e>>(
    exec: E,
    id: i64,
    input: &MissionInput,
) -> ApiResult<()> {
    let result = sqlx::query(
        "UPDATE missions
         SET name = $2, spaceship_id = $3, launch_date = $4,
             landing_date = $5, status = $6, destination = $7
         WHERE id = $1",
    )
    .bind(id)
    .bind(&input.name)
    .bind(input.spaceship_id)
    .bind(input.launch_date)
    .bind(input.landing_date)
    .bind(input.status.as_str())
    .bind(&input.destination)
    .execute(exec)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("mission {id}")));
    }
    Ok(())
}

/// Replace the mission's crew assignments wholesale. Runs on the save
/// transaction's connection so a partial crew is never observable.
pub async fn replace_crew(
    conn: &mut PgConnection,
    mission_id: i64,
    crew: &[i64],
) -> ApiResult<()> {
    sqlx::query("DELETE FROM mission_crew WHERE mission_id = $1")
        .bind(mission_id)
        .execute(&mut *conn)
        .await?;
    if !crew.is_empty() {
        sqlx::query(
            "INSERT INTO mission_crew (mission_id, astronaut_id)
             SELECT $1, unnest($2::bigint[])",
        )
        .bind(mission_id)
        .bind(crew)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Initialize database tables
pub async fn init_db(pool: &PgPool) -> ApiResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS astronauts(
            id BIGSERIAL PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            birth_date DATE NOT NULL,
            nationality TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS spaceships(
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            manufacturer TEXT NOT NULL,
            launch_date DATE NOT NULL,
            capacity INTEGER NOT NULL DEFAULT 0,
            mass DOUBLE PRECISION NOT NULL,
            is_available BOOLEAN NOT NULL DEFAULT TRUE
        )",
    )
    .execute(pool)
    .await?;

    // Spaceship deletion is blocked while missions reference it
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS missions(
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            spaceship_id BIGINT NOT NULL REFERENCES spaceships(id) ON DELETE RESTRICT,
            launch_date TIMESTAMPTZ NOT NULL,
            landing_date TIMESTAMPTZ,
            status TEXT NOT NULL DEFAULT 'Planned',
            destination TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS mission_crew(
            mission_id BIGINT NOT NULL REFERENCES missions(id) ON DELETE CASCADE,
            astronaut_id BIGINT NOT NULL REFERENCES astronauts(id) ON DELETE RESTRICT,
            PRIMARY KEY (mission_id, astronaut_id)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS ix_missions_spaceship_status
         ON missions(spaceship_id, status)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS ix_mission_crew_astronaut
         ON mission_crew(astronaut_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
