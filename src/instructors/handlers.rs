use axum::{
    extract::{Path, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::auth::session::InstructorSession;
use crate::error::AppError;
use crate::instructors::dto::{
    BmiRequest, BmiResponse, BmrRequest, BmrResponse, InstructorProfile, LinkStudentRequest,
    NoticeResponse, StudentDetailResponse, StudentListResponse, StudentSummary,
};
use crate::metrics;
use crate::state::AppState;
use crate::store::Store;
use crate::students::dto::StudentProfile;
use crate::validation::positive_number;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/instructor_dashboard", get(dashboard))
        .route(
            "/instructor_students",
            get(list_students).post(link_student),
        )
        .route("/student_details/:id", get(student_details))
        .route("/bmi_calculator", get(bmi_form).post(bmi_calculate))
        .route("/bmr_calculator", get(bmr_form).post(bmr_calculate))
}

/// The instructor dashboard is the student list.
pub async fn dashboard(InstructorSession(_): InstructorSession) -> Redirect {
    Redirect::to("/instructor_students")
}

#[instrument(skip(state))]
pub async fn list_students(
    State(state): State<AppState>,
    InstructorSession(instructor_id): InstructorSession,
) -> Result<Json<StudentListResponse>, AppError> {
    let instructor = state
        .store
        .instructor_by_id(instructor_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Instructor not found!".into()))?;
    let students = state
        .store
        .linked_students(instructor_id)
        .await?
        .into_iter()
        .map(StudentSummary::from)
        .collect();
    Ok(Json(StudentListResponse {
        instructor: InstructorProfile::from(instructor),
        students,
    }))
}

#[instrument(skip(state, payload))]
pub async fn link_student(
    State(state): State<AppState>,
    InstructorSession(instructor_id): InstructorSession,
    Json(payload): Json<LinkStudentRequest>,
) -> Result<Json<NoticeResponse>, AppError> {
    let code = payload.student_id.trim().to_string();
    let student = state
        .store
        .student_by_code(&code)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found!".into()))?;

    let created = state.store.create_link(student.id, instructor_id).await?;
    let notice = if created {
        info!(instructor_id, student_id = student.id, "student linked");
        "Student added successfully!"
    } else {
        "Student already in your list!"
    };
    Ok(Json(NoticeResponse {
        notice: notice.into(),
    }))
}

#[instrument(skip(state))]
pub async fn student_details(
    State(state): State<AppState>,
    InstructorSession(instructor_id): InstructorSession,
    Path(student_id): Path<i64>,
) -> Result<Json<StudentDetailResponse>, AppError> {
    // Only linked students are visible; nothing is returned otherwise.
    if !state.store.link_exists(student_id, instructor_id).await? {
        return Err(AppError::AccessDenied("Access denied!".into()));
    }
    let student = state
        .store
        .student_by_id(student_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found!".into()))?;
    let weight_records = state.store.weight_records(student_id).await?;
    Ok(Json(StudentDetailResponse {
        student: StudentProfile::from(student),
        weight_records,
    }))
}

async fn bmi_form(InstructorSession(_): InstructorSession) -> Json<Value> {
    Json(json!({ "fields": ["weight", "height"] }))
}

#[instrument]
pub async fn bmi_calculate(
    InstructorSession(_): InstructorSession,
    Json(payload): Json<BmiRequest>,
) -> Result<Json<BmiResponse>, AppError> {
    positive_number("Weight", payload.weight)?;
    positive_number("Height", payload.height)?;
    Ok(Json(BmiResponse {
        bmi: metrics::bmi(payload.weight, payload.height),
    }))
}

async fn bmr_form(InstructorSession(_): InstructorSession) -> Json<Value> {
    Json(json!({
        "fields": ["gender", "weight", "height", "age", "activity_level"]
    }))
}

#[instrument]
pub async fn bmr_calculate(
    InstructorSession(_): InstructorSession,
    Json(payload): Json<BmrRequest>,
) -> Result<Json<BmrResponse>, AppError> {
    positive_number("Weight", payload.weight)?;
    positive_number("Height", payload.height)?;
    Ok(Json(BmrResponse {
        bmr: metrics::bmr(&payload.gender, payload.weight, payload.height, payload.age),
        activity_factor: payload.activity_level,
    }))
}
