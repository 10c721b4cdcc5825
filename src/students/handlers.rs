use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::auth::session::StudentSession;
use crate::error::AppError;
use crate::state::AppState;
use crate::store::{Store, Student};
use crate::students::dto::{
    AddWeightRequest, DashboardResponse, DeleteResponse, NoticeResponse, StudentProfile,
    UpdateProfileRequest, WeightAddedResponse,
};
use crate::students::services;
use crate::validation::positive_number;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/student_dashboard", get(dashboard).post(add_weight))
        .route(
            "/update_student_profile",
            get(profile).post(update_profile),
        )
        .route("/delete_weight_record/:id", get(delete_weight_record))
}

async fn load_student(state: &AppState, id: i64) -> Result<Student, AppError> {
    state
        .store
        .student_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found!".into()))
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    StudentSession(student_id): StudentSession,
) -> Result<Json<DashboardResponse>, AppError> {
    let student = load_student(&state, student_id).await?;
    let weight_records = state.store.weight_records(student_id).await?;
    Ok(Json(DashboardResponse {
        student: StudentProfile::from(student),
        weight_records,
    }))
}

#[instrument(skip(state, payload))]
pub async fn add_weight(
    State(state): State<AppState>,
    StudentSession(student_id): StudentSession,
    Json(payload): Json<AddWeightRequest>,
) -> Result<Json<WeightAddedResponse>, AppError> {
    positive_number("Weight", payload.weight)?;
    let student = load_student(&state, student_id).await?;
    let record =
        services::record_weigh_in(state.store.as_ref(), &student, payload.weight).await?;
    info!(student_id, record_id = record.id, "weight record added");
    Ok(Json(WeightAddedResponse {
        notice: "Weight record added successfully!".into(),
        record,
    }))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    StudentSession(student_id): StudentSession,
) -> Result<Json<StudentProfile>, AppError> {
    let student = load_student(&state, student_id).await?;
    Ok(Json(StudentProfile::from(student)))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    StudentSession(student_id): StudentSession,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<NoticeResponse>, AppError> {
    if let Some(height) = payload.height {
        positive_number("Height", height)?;
    }
    if let Some(goal_weight) = payload.goal_weight {
        positive_number("Goal weight", goal_weight)?;
    }
    load_student(&state, student_id).await?;
    state
        .store
        .update_student_profile(student_id, payload.height, payload.goal_weight)
        .await?;
    info!(student_id, "profile updated");
    Ok(Json(NoticeResponse {
        notice: "Profile updated successfully!".into(),
    }))
}

#[instrument(skip(state))]
pub async fn delete_weight_record(
    State(state): State<AppState>,
    StudentSession(student_id): StudentSession,
    Path(record_id): Path<i64>,
) -> Result<Json<DeleteResponse>, AppError> {
    let Some(record) = state.store.weight_record_by_id(record_id).await? else {
        // Unknown records are ignored without a notice.
        return Ok(Json(DeleteResponse {
            deleted: false,
            notice: None,
        }));
    };
    if record.student_id != student_id {
        // Someone else's record: ignored, nothing reported.
        return Ok(Json(DeleteResponse {
            deleted: false,
            notice: None,
        }));
    }
    let earliest = state.store.earliest_weight_record_id(student_id).await?;
    if earliest == Some(record.id) {
        return Err(AppError::Validation("Cannot delete starting weight!".into()));
    }
    state.store.delete_weight_record(record.id).await?;
    info!(student_id, record_id, "weight record deleted");
    Ok(Json(DeleteResponse {
        deleted: true,
        notice: Some("Weight record deleted successfully!".into()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{NewStudent, Store};
    use time::macros::date;

    async fn seed_student(store: &dyn Store, email: &str, code: &str) -> Student {
        store
            .create_student(NewStudent {
                code: code.into(),
                name: "Ana".into(),
                surname: "Lee".into(),
                email: email.into(),
                birth_date: date!(2000 - 01 - 01),
                height: 170.0,
                weight: 65.0,
                gender: "female".into(),
                goal_weight: 60.0,
                password_hash: "irrelevant".into(),
            })
            .await
            .expect("seed student")
    }

    #[tokio::test]
    async fn add_weight_derives_metrics_from_stored_profile() {
        let state = AppState::fake();
        let student = seed_student(state.store.as_ref(), "a@x.com", "AAAAAA").await;

        let Json(resp) = add_weight(
            State(state.clone()),
            StudentSession(student.id),
            Json(AddWeightRequest { weight: 63.0 }),
        )
        .await
        .expect("add weight");

        assert_eq!(resp.record.weight, 63.0);
        // 63 / 1.70^2 = 21.799... -> 21.8
        assert_eq!(resp.record.bmi, 21.8);
        assert!(resp.record.bmr > 0.0);

        let Json(dash) = dashboard(State(state), StudentSession(student.id))
            .await
            .expect("dashboard");
        assert_eq!(dash.weight_records.len(), 1);
    }

    #[tokio::test]
    async fn starting_record_cannot_be_deleted() {
        let state = AppState::fake();
        let student = seed_student(state.store.as_ref(), "a@x.com", "AAAAAA").await;
        let first = services::record_weigh_in(state.store.as_ref(), &student, 65.0)
            .await
            .expect("first record");
        let second = services::record_weigh_in(state.store.as_ref(), &student, 63.0)
            .await
            .expect("second record");

        let err = delete_weight_record(
            State(state.clone()),
            StudentSession(student.id),
            Path(first.id),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let Json(resp) = delete_weight_record(
            State(state.clone()),
            StudentSession(student.id),
            Path(second.id),
        )
        .await
        .expect("delete second");
        assert!(resp.deleted);

        let records = state.store.weight_records(student.id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, first.id);
    }

    #[tokio::test]
    async fn deleting_someone_elses_record_is_a_silent_noop() {
        let state = AppState::fake();
        let owner = seed_student(state.store.as_ref(), "owner@x.com", "AAAAAA").await;
        let other = seed_student(state.store.as_ref(), "other@x.com", "BBBBBB").await;
        services::record_weigh_in(state.store.as_ref(), &owner, 65.0)
            .await
            .expect("baseline");
        let target = services::record_weigh_in(state.store.as_ref(), &owner, 63.0)
            .await
            .expect("second");

        let Json(resp) = delete_weight_record(
            State(state.clone()),
            StudentSession(other.id),
            Path(target.id),
        )
        .await
        .expect("no error surfaced");
        assert!(!resp.deleted);
        assert!(resp.notice.is_none());

        let records = state.store.weight_records(owner.id).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn profile_update_is_partial() {
        let state = AppState::fake();
        let student = seed_student(state.store.as_ref(), "a@x.com", "AAAAAA").await;

        update_profile(
            State(state.clone()),
            StudentSession(student.id),
            Json(UpdateProfileRequest {
                height: None,
                goal_weight: Some(58.0),
            }),
        )
        .await
        .expect("update");

        let updated = state
            .store
            .student_by_id(student.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.height, 170.0);
        assert_eq!(updated.goal_weight, 58.0);
    }
}
