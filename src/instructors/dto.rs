use serde::{Deserialize, Serialize};

use crate::store::{Instructor, Student, WeightRecord};
use crate::students::dto::StudentProfile;

/// Link request; the form field carries the student's public code.
#[derive(Debug, Deserialize)]
pub struct LinkStudentRequest {
    pub student_id: String,
}

#[derive(Debug, Serialize)]
pub struct NoticeResponse {
    pub notice: String,
}

/// Row in the instructor's linked-student list.
#[derive(Debug, Serialize)]
pub struct StudentSummary {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub surname: String,
}

impl From<Student> for StudentSummary {
    fn from(s: Student) -> Self {
        Self {
            id: s.id,
            code: s.code,
            name: s.name,
            surname: s.surname,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InstructorProfile {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub email: String,
}

impl From<Instructor> for InstructorProfile {
    fn from(i: Instructor) -> Self {
        Self {
            id: i.id,
            name: i.name,
            surname: i.surname,
            email: i.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StudentListResponse {
    pub instructor: InstructorProfile,
    pub students: Vec<StudentSummary>,
}

#[derive(Debug, Serialize)]
pub struct StudentDetailResponse {
    pub student: StudentProfile,
    pub weight_records: Vec<WeightRecord>,
}

#[derive(Debug, Deserialize)]
pub struct BmiRequest {
    pub weight: f64,
    pub height: f64,
}

#[derive(Debug, Serialize)]
pub struct BmiResponse {
    pub bmi: f64,
}

#[derive(Debug, Deserialize)]
pub struct BmrRequest {
    pub gender: String,
    pub weight: f64,
    pub height: f64,
    pub age: i32,
    pub activity_level: f64,
}

/// The activity factor is echoed for the client to display; it is not folded
/// into the BMR figure.
#[derive(Debug, Serialize)]
pub struct BmrResponse {
    pub bmr: f64,
    pub activity_factor: f64,
}
