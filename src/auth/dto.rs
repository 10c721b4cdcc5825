use serde::{Deserialize, Serialize};
use time::Date;

use super::session::Role;

/// Student registration form.
#[derive(Debug, Deserialize)]
pub struct RegisterStudentRequest {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub birth_date: Date,
    pub height: f64,
    pub weight: f64,
    pub gender: String,
    pub goal_weight: f64,
    pub password: String,
}

/// Returned on student registration; the code is the student's only handle
/// for instructor linking, so it is surfaced both raw and in the notice.
#[derive(Debug, Serialize)]
pub struct StudentRegisteredResponse {
    pub notice: String,
    pub code: String,
}

/// Instructor registration form.
#[derive(Debug, Deserialize)]
pub struct RegisterInstructorRequest {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Session established; `role` tells the client which dashboard to load.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub role: Role,
    pub id: i64,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct NoticeResponse {
    pub notice: String,
}
