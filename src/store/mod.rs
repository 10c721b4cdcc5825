mod mem;
mod pg;

pub use mem::MemStore;
pub use pg::PgStore;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;
use thiserror::Error;
use time::{Date, OffsetDateTime};

/// Student record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Student {
    pub id: i64,
    pub code: String, // 6-char public identifier shared with instructors
    pub name: String,
    pub surname: String,
    pub email: String,
    pub birth_date: Date,
    pub height: f64,
    pub weight: f64,
    pub gender: String,
    pub goal_weight: f64,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Instructor record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Instructor {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// One weigh-in with its derived metrics.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WeightRecord {
    pub id: i64,
    pub student_id: i64,
    pub recorded_at: OffsetDateTime,
    pub weight: f64,
    pub bmi: f64,
    pub bmr: f64,
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub code: String,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub birth_date: Date,
    pub height: f64,
    pub weight: f64,
    pub gender: String,
    pub goal_weight: f64,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewInstructor {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewWeightRecord {
    pub student_id: i64,
    pub weight: f64,
    pub bmi: f64,
    pub bmr: f64,
}

/// Column a unique constraint fired on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Code,
    Link,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate value for {0:?}")]
    Duplicate(UniqueField),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Data-access seam between handlers and persistence. Backed by Postgres in
/// production and by [`MemStore`] in tests.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_student(&self, new: NewStudent) -> Result<Student, StoreError>;
    async fn student_by_id(&self, id: i64) -> Result<Option<Student>, StoreError>;
    async fn student_by_email(&self, email: &str) -> Result<Option<Student>, StoreError>;
    async fn student_by_code(&self, code: &str) -> Result<Option<Student>, StoreError>;
    async fn code_taken(&self, code: &str) -> Result<bool, StoreError>;
    async fn update_student_profile(
        &self,
        id: i64,
        height: Option<f64>,
        goal_weight: Option<f64>,
    ) -> Result<(), StoreError>;

    async fn create_instructor(&self, new: NewInstructor) -> Result<Instructor, StoreError>;
    async fn instructor_by_id(&self, id: i64) -> Result<Option<Instructor>, StoreError>;
    async fn instructor_by_email(&self, email: &str) -> Result<Option<Instructor>, StoreError>;

    async fn add_weight_record(&self, new: NewWeightRecord) -> Result<WeightRecord, StoreError>;
    /// All records for a student, ascending by id.
    async fn weight_records(&self, student_id: i64) -> Result<Vec<WeightRecord>, StoreError>;
    async fn weight_record_by_id(&self, id: i64) -> Result<Option<WeightRecord>, StoreError>;
    async fn earliest_weight_record_id(&self, student_id: i64)
        -> Result<Option<i64>, StoreError>;
    async fn delete_weight_record(&self, id: i64) -> Result<(), StoreError>;

    /// Returns `false` when the pair was already linked.
    async fn create_link(&self, student_id: i64, instructor_id: i64) -> Result<bool, StoreError>;
    async fn link_exists(&self, student_id: i64, instructor_id: i64) -> Result<bool, StoreError>;
    async fn linked_students(&self, instructor_id: i64) -> Result<Vec<Student>, StoreError>;
}
