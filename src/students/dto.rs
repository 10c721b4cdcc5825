use serde::{Deserialize, Serialize};
use time::Date;

use crate::store::{Student, WeightRecord};

/// Student profile as shown on the dashboard; no credentials.
#[derive(Debug, Serialize)]
pub struct StudentProfile {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub birth_date: Date,
    pub height: f64,
    pub weight: f64,
    pub gender: String,
    pub goal_weight: f64,
}

impl From<Student> for StudentProfile {
    fn from(s: Student) -> Self {
        Self {
            id: s.id,
            code: s.code,
            name: s.name,
            surname: s.surname,
            email: s.email,
            birth_date: s.birth_date,
            height: s.height,
            weight: s.weight,
            gender: s.gender,
            goal_weight: s.goal_weight,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub student: StudentProfile,
    pub weight_records: Vec<WeightRecord>,
}

#[derive(Debug, Deserialize)]
pub struct AddWeightRequest {
    pub weight: f64,
}

#[derive(Debug, Serialize)]
pub struct WeightAddedResponse {
    pub notice: String,
    pub record: WeightRecord,
}

/// Partial update: absent fields are left untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub height: Option<f64>,
    pub goal_weight: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct NoticeResponse {
    pub notice: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}
