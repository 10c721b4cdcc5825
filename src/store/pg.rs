use async_trait::async_trait;
use sqlx::PgPool;

use super::{
    Instructor, NewInstructor, NewStudent, NewWeightRecord, Store, StoreError, Student,
    UniqueField, WeightRecord,
};

/// Postgres-backed store. Uniqueness of email, student code and the
/// (student, instructor) pair is enforced by the schema, so races between
/// concurrent registrations surface as `StoreError::Duplicate`.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_db_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            let constraint = db.constraint().unwrap_or_default();
            let field = if constraint.contains("email") {
                UniqueField::Email
            } else if constraint.contains("code") {
                UniqueField::Code
            } else {
                UniqueField::Link
            };
            return StoreError::Duplicate(field);
        }
    }
    StoreError::Other(e.into())
}

#[async_trait]
impl Store for PgStore {
    async fn create_student(&self, new: NewStudent) -> Result<Student, StoreError> {
        sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students
                (code, name, surname, email, birth_date, height, weight, gender,
                 goal_weight, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, code, name, surname, email, birth_date, height, weight,
                      gender, goal_weight, password_hash
            "#,
        )
        .bind(&new.code)
        .bind(&new.name)
        .bind(&new.surname)
        .bind(&new.email)
        .bind(new.birth_date)
        .bind(new.height)
        .bind(new.weight)
        .bind(&new.gender)
        .bind(new.goal_weight)
        .bind(&new.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn student_by_id(&self, id: i64) -> Result<Option<Student>, StoreError> {
        sqlx::query_as::<_, Student>(
            r#"
            SELECT id, code, name, surname, email, birth_date, height, weight,
                   gender, goal_weight, password_hash
            FROM students
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn student_by_email(&self, email: &str) -> Result<Option<Student>, StoreError> {
        sqlx::query_as::<_, Student>(
            r#"
            SELECT id, code, name, surname, email, birth_date, height, weight,
                   gender, goal_weight, password_hash
            FROM students
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn student_by_code(&self, code: &str) -> Result<Option<Student>, StoreError> {
        sqlx::query_as::<_, Student>(
            r#"
            SELECT id, code, name, surname, email, birth_date, height, weight,
                   gender, goal_weight, password_hash
            FROM students
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn code_taken(&self, code: &str) -> Result<bool, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as(r#"SELECT id FROM students WHERE code = $1"#)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(row.is_some())
    }

    async fn update_student_profile(
        &self,
        id: i64,
        height: Option<f64>,
        goal_weight: Option<f64>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE students
            SET height = COALESCE($2, height),
                goal_weight = COALESCE($3, goal_weight)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(height)
        .bind(goal_weight)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn create_instructor(&self, new: NewInstructor) -> Result<Instructor, StoreError> {
        sqlx::query_as::<_, Instructor>(
            r#"
            INSERT INTO instructors (name, surname, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, surname, email, password_hash
            "#,
        )
        .bind(&new.name)
        .bind(&new.surname)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn instructor_by_id(&self, id: i64) -> Result<Option<Instructor>, StoreError> {
        sqlx::query_as::<_, Instructor>(
            r#"
            SELECT id, name, surname, email, password_hash
            FROM instructors
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn instructor_by_email(&self, email: &str) -> Result<Option<Instructor>, StoreError> {
        sqlx::query_as::<_, Instructor>(
            r#"
            SELECT id, name, surname, email, password_hash
            FROM instructors
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn add_weight_record(&self, new: NewWeightRecord) -> Result<WeightRecord, StoreError> {
        sqlx::query_as::<_, WeightRecord>(
            r#"
            INSERT INTO weight_records (student_id, weight, bmi, bmr)
            VALUES ($1, $2, $3, $4)
            RETURNING id, student_id, recorded_at, weight, bmi, bmr
            "#,
        )
        .bind(new.student_id)
        .bind(new.weight)
        .bind(new.bmi)
        .bind(new.bmr)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn weight_records(&self, student_id: i64) -> Result<Vec<WeightRecord>, StoreError> {
        sqlx::query_as::<_, WeightRecord>(
            r#"
            SELECT id, student_id, recorded_at, weight, bmi, bmr
            FROM weight_records
            WHERE student_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn weight_record_by_id(&self, id: i64) -> Result<Option<WeightRecord>, StoreError> {
        sqlx::query_as::<_, WeightRecord>(
            r#"
            SELECT id, student_id, recorded_at, weight, bmi, bmr
            FROM weight_records
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn earliest_weight_record_id(
        &self,
        student_id: i64,
    ) -> Result<Option<i64>, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT id FROM weight_records
            WHERE student_id = $1
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(row.map(|(id,)| id))
    }

    async fn delete_weight_record(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query(r#"DELETE FROM weight_records WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn create_link(&self, student_id: i64, instructor_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO student_instructors (student_id, instructor_id)
            VALUES ($1, $2)
            ON CONFLICT (student_id, instructor_id) DO NOTHING
            "#,
        )
        .bind(student_id)
        .bind(instructor_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn link_exists(&self, student_id: i64, instructor_id: i64) -> Result<bool, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT id FROM student_instructors
            WHERE student_id = $1 AND instructor_id = $2
            "#,
        )
        .bind(student_id)
        .bind(instructor_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(row.is_some())
    }

    async fn linked_students(&self, instructor_id: i64) -> Result<Vec<Student>, StoreError> {
        sqlx::query_as::<_, Student>(
            r#"
            SELECT s.id, s.code, s.name, s.surname, s.email, s.birth_date, s.height,
                   s.weight, s.gender, s.goal_weight, s.password_hash
            FROM students s
            JOIN student_instructors si ON si.student_id = s.id
            WHERE si.instructor_id = $1
            ORDER BY s.id ASC
            "#,
        )
        .bind(instructor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)
    }
}
