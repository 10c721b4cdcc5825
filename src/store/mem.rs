use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::{
    Instructor, NewInstructor, NewStudent, NewWeightRecord, Store, StoreError, Student,
    UniqueField, WeightRecord,
};

#[derive(Default)]
struct Inner {
    students: Vec<Student>,
    instructors: Vec<Instructor>,
    records: Vec<WeightRecord>,
    links: Vec<(i64, i64, i64)>, // (id, student_id, instructor_id)
    next_student_id: i64,
    next_instructor_id: i64,
    next_record_id: i64,
    next_link_id: i64,
}

/// In-memory store used by tests and `AppState::fake()`. Mimics the schema's
/// unique constraints so conflict paths behave like Postgres.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemStore {
    async fn create_student(&self, new: NewStudent) -> Result<Student, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.students.iter().any(|s| s.email == new.email) {
            return Err(StoreError::Duplicate(UniqueField::Email));
        }
        if inner.students.iter().any(|s| s.code == new.code) {
            return Err(StoreError::Duplicate(UniqueField::Code));
        }
        inner.next_student_id += 1;
        let student = Student {
            id: inner.next_student_id,
            code: new.code,
            name: new.name,
            surname: new.surname,
            email: new.email,
            birth_date: new.birth_date,
            height: new.height,
            weight: new.weight,
            gender: new.gender,
            goal_weight: new.goal_weight,
            password_hash: new.password_hash,
        };
        inner.students.push(student.clone());
        Ok(student)
    }

    async fn student_by_id(&self, id: i64) -> Result<Option<Student>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.students.iter().find(|s| s.id == id).cloned())
    }

    async fn student_by_email(&self, email: &str) -> Result<Option<Student>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.students.iter().find(|s| s.email == email).cloned())
    }

    async fn student_by_code(&self, code: &str) -> Result<Option<Student>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.students.iter().find(|s| s.code == code).cloned())
    }

    async fn code_taken(&self, code: &str) -> Result<bool, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.students.iter().any(|s| s.code == code))
    }

    async fn update_student_profile(
        &self,
        id: i64,
        height: Option<f64>,
        goal_weight: Option<f64>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(student) = inner.students.iter_mut().find(|s| s.id == id) {
            if let Some(h) = height {
                student.height = h;
            }
            if let Some(g) = goal_weight {
                student.goal_weight = g;
            }
        }
        Ok(())
    }

    async fn create_instructor(&self, new: NewInstructor) -> Result<Instructor, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.instructors.iter().any(|i| i.email == new.email) {
            return Err(StoreError::Duplicate(UniqueField::Email));
        }
        inner.next_instructor_id += 1;
        let instructor = Instructor {
            id: inner.next_instructor_id,
            name: new.name,
            surname: new.surname,
            email: new.email,
            password_hash: new.password_hash,
        };
        inner.instructors.push(instructor.clone());
        Ok(instructor)
    }

    async fn instructor_by_id(&self, id: i64) -> Result<Option<Instructor>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.instructors.iter().find(|i| i.id == id).cloned())
    }

    async fn instructor_by_email(&self, email: &str) -> Result<Option<Instructor>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.instructors.iter().find(|i| i.email == email).cloned())
    }

    async fn add_weight_record(&self, new: NewWeightRecord) -> Result<WeightRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_record_id += 1;
        let record = WeightRecord {
            id: inner.next_record_id,
            student_id: new.student_id,
            recorded_at: OffsetDateTime::now_utc(),
            weight: new.weight,
            bmi: new.bmi,
            bmr: new.bmr,
        };
        inner.records.push(record.clone());
        Ok(record)
    }

    async fn weight_records(&self, student_id: i64) -> Result<Vec<WeightRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut records: Vec<WeightRecord> = inner
            .records
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    async fn weight_record_by_id(&self, id: i64) -> Result<Option<WeightRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.records.iter().find(|r| r.id == id).cloned())
    }

    async fn earliest_weight_record_id(
        &self,
        student_id: i64,
    ) -> Result<Option<i64>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .records
            .iter()
            .filter(|r| r.student_id == student_id)
            .map(|r| r.id)
            .min())
    }

    async fn delete_weight_record(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.records.retain(|r| r.id != id);
        Ok(())
    }

    async fn create_link(&self, student_id: i64, instructor_id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .links
            .iter()
            .any(|&(_, s, i)| s == student_id && i == instructor_id)
        {
            return Ok(false);
        }
        inner.next_link_id += 1;
        let link_id = inner.next_link_id;
        inner.links.push((link_id, student_id, instructor_id));
        Ok(true)
    }

    async fn link_exists(&self, student_id: i64, instructor_id: i64) -> Result<bool, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .links
            .iter()
            .any(|&(_, s, i)| s == student_id && i == instructor_id))
    }

    async fn linked_students(&self, instructor_id: i64) -> Result<Vec<Student>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut students: Vec<Student> = inner
            .links
            .iter()
            .filter(|&&(_, _, i)| i == instructor_id)
            .filter_map(|&(_, s, _)| inner.students.iter().find(|st| st.id == s).cloned())
            .collect();
        students.sort_by_key(|s| s.id);
        Ok(students)
    }
}
