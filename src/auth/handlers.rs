use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::auth::dto::{
    LoginRequest, LoginResponse, NoticeResponse, RegisterInstructorRequest,
    RegisterStudentRequest, StudentRegisteredResponse,
};
use crate::auth::session::{Role, SessionKeys};
use crate::auth::{password, services};
use crate::error::AppError;
use crate::state::AppState;
use crate::store::{NewInstructor, NewStudent, Store, StoreError, UniqueField};
use crate::students;
use crate::validation::{is_valid_email, positive_number};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/register_student",
            get(register_student_form).post(register_student),
        )
        .route(
            "/register_instructor",
            get(register_instructor_form).post(register_instructor),
        )
        .route("/login", post(login))
        .route("/logout", get(logout))
}

async fn register_student_form() -> Json<Value> {
    Json(json!({
        "fields": [
            "name", "surname", "email", "birth_date", "height", "weight",
            "gender", "goal_weight", "password"
        ]
    }))
}

#[instrument(skip(state, payload))]
pub async fn register_student(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterStudentRequest>,
) -> Result<Json<StudentRegisteredResponse>, AppError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }
    let today = OffsetDateTime::now_utc().date();
    if payload.birth_date > today {
        return Err(AppError::Validation(
            "Birth date cannot be in the future!".into(),
        ));
    }
    positive_number("Height", payload.height)?;
    positive_number("Weight", payload.weight)?;
    positive_number("Goal weight", payload.goal_weight)?;

    services::ensure_email_available(state.store.as_ref(), &payload.email).await?;

    let password_hash = password::hash_password(&payload.password)?;

    // The pre-checked code can still collide with a concurrent registration;
    // the unique constraint reports it and we draw again.
    let student = loop {
        let code = services::allocate_code(state.store.as_ref()).await?;
        let new = NewStudent {
            code,
            name: payload.name.clone(),
            surname: payload.surname.clone(),
            email: payload.email.clone(),
            birth_date: payload.birth_date,
            height: payload.height,
            weight: payload.weight,
            gender: payload.gender.clone(),
            goal_weight: payload.goal_weight,
            password_hash: password_hash.clone(),
        };
        match state.store.create_student(new).await {
            Ok(s) => break s,
            Err(StoreError::Duplicate(UniqueField::Code)) => continue,
            Err(e) => return Err(e.into()),
        }
    };

    // The registration weight becomes the starting baseline record.
    students::services::record_weigh_in(state.store.as_ref(), &student, student.weight).await?;

    info!(student_id = student.id, code = %student.code, "student registered");
    Ok(Json(StudentRegisteredResponse {
        notice: format!(
            "Registration successful! Your unique ID is: {}",
            student.code
        ),
        code: student.code.clone(),
    }))
}

async fn register_instructor_form() -> Json<Value> {
    Json(json!({
        "fields": ["name", "surname", "email", "password"]
    }))
}

#[instrument(skip(state, payload))]
pub async fn register_instructor(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterInstructorRequest>,
) -> Result<Json<NoticeResponse>, AppError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }

    services::ensure_email_available(state.store.as_ref(), &payload.email).await?;

    let password_hash = password::hash_password(&payload.password)?;
    let instructor = state
        .store
        .create_instructor(NewInstructor {
            name: payload.name,
            surname: payload.surname,
            email: payload.email,
            password_hash,
        })
        .await?;

    info!(instructor_id = instructor.id, "instructor registered");
    Ok(Json(NoticeResponse {
        notice: "Registration successful!".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.email = payload.email.trim().to_lowercase();
    let keys = SessionKeys::from_ref(&state);

    // Students first; email is unique across roles so at most one matches.
    if let Some(student) = state.store.student_by_email(&payload.email).await? {
        if password::verify_password(&payload.password, &student.password_hash)? {
            let token = keys.sign(student.id, Role::Student)?;
            info!(student_id = student.id, "student logged in");
            return Ok(Json(LoginResponse {
                role: Role::Student,
                id: student.id,
                token,
            }));
        }
    }

    if let Some(instructor) = state.store.instructor_by_email(&payload.email).await? {
        if password::verify_password(&payload.password, &instructor.password_hash)? {
            let token = keys.sign(instructor.id, Role::Instructor)?;
            info!(instructor_id = instructor.id, "instructor logged in");
            return Ok(Json(LoginResponse {
                role: Role::Instructor,
                id: instructor.id,
                token,
            }));
        }
    }

    warn!(email = %payload.email, "login rejected");
    Err(AppError::InvalidCredentials(
        "Invalid email or password!".into(),
    ))
}

/// Sessions live in the signed token, so logout is an acknowledgement; the
/// client discards the token.
async fn logout() -> Json<NoticeResponse> {
    Json(NoticeResponse {
        notice: "Logged out.".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn student_req(email: &str) -> RegisterStudentRequest {
        RegisterStudentRequest {
            name: "Ana".into(),
            surname: "Lee".into(),
            email: email.into(),
            birth_date: date!(2000 - 01 - 01),
            height: 170.0,
            weight: 65.0,
            gender: "female".into(),
            goal_weight: 60.0,
            password: "s3cret-pass".into(),
        }
    }

    fn instructor_req(email: &str) -> RegisterInstructorRequest {
        RegisterInstructorRequest {
            name: "Ion".into(),
            surname: "Pop".into(),
            email: email.into(),
            password: "coach-pass".into(),
        }
    }

    #[tokio::test]
    async fn registration_returns_a_six_char_code() {
        let state = AppState::fake();
        let Json(resp) = register_student(State(state.clone()), Json(student_req("a@x.com")))
            .await
            .expect("register");
        assert_eq!(resp.code.len(), 6);
        assert!(resp.notice.contains(&resp.code));

        // The registration weight is persisted as the starting record.
        let student = state
            .store
            .student_by_email("a@x.com")
            .await
            .unwrap()
            .unwrap();
        let records = state.store.weight_records(student.id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].weight, 65.0);
        assert_eq!(records[0].bmi, 22.49);
    }

    #[tokio::test]
    async fn future_birth_date_is_rejected() {
        let state = AppState::fake();
        let mut req = student_req("a@x.com");
        req.birth_date = date!(2999 - 01 - 01);
        let err = register_student(State(state), Json(req)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_across_roles() {
        let state = AppState::fake();
        register_student(State(state.clone()), Json(student_req("same@x.com")))
            .await
            .expect("student first");
        let err = register_instructor(State(state.clone()), Json(instructor_req("same@x.com")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        register_instructor(State(state.clone()), Json(instructor_req("coach@x.com")))
            .await
            .expect("instructor first");
        let err = register_student(State(state), Json(student_req("coach@x.com")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn registered_codes_are_distinct() {
        let state = AppState::fake();
        let mut codes = std::collections::HashSet::new();
        for i in 0..20 {
            let Json(resp) = register_student(
                State(state.clone()),
                Json(student_req(&format!("s{i}@x.com"))),
            )
            .await
            .expect("register");
            codes.insert(resp.code);
        }
        assert_eq!(codes.len(), 20);
    }

    #[tokio::test]
    async fn login_reports_the_role_and_rejects_bad_credentials() {
        let state = AppState::fake();
        register_student(State(state.clone()), Json(student_req("a@x.com")))
            .await
            .expect("register student");
        register_instructor(State(state.clone()), Json(instructor_req("c@x.com")))
            .await
            .expect("register instructor");

        let Json(resp) = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "a@x.com".into(),
                password: "s3cret-pass".into(),
            }),
        )
        .await
        .expect("student login");
        assert_eq!(resp.role, Role::Student);

        let Json(resp) = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "c@x.com".into(),
                password: "coach-pass".into(),
            }),
        )
        .await
        .expect("instructor login");
        assert_eq!(resp.role, Role::Instructor);

        let err = login(
            State(state),
            Json(LoginRequest {
                email: "a@x.com".into(),
                password: "wrong".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials(_)));
    }
}
