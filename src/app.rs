use std::net::SocketAddr;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, instructors, students};

async fn landing() -> Json<Value> {
    Json(json!({
        "app": "healthtrack",
        "message": "Track weight, BMI and BMR under instructor supervision."
    }))
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing))
        .merge(auth::router())
        .merge(students::router())
        .merge(instructors::router())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::extract::{FromRef, Path, State};
    use axum::http::{header, Request, StatusCode};
    use axum::Json;
    use time::macros::date;
    use tower::ServiceExt;

    use crate::auth::dto::{LoginRequest, RegisterStudentRequest};
    use crate::auth::handlers::{login, register_student};
    use crate::auth::session::{Role, SessionKeys};
    use crate::error::AppError;
    use crate::state::AppState;
    use crate::students::dto::AddWeightRequest;
    use crate::students::handlers::{add_weight, dashboard, delete_weight_record};

    #[tokio::test]
    async fn gated_endpoints_bounce_to_the_landing_page() {
        let state = AppState::fake();
        let app = super::build_app(state.clone());

        // No session at all.
        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/student_dashboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/");

        // A token that does not verify.
        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/instructor_students")
                    .header(header::AUTHORIZATION, "Bearer not-a-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/");

        // A valid session of the wrong role.
        let keys = SessionKeys::from_ref(&state);
        let token = keys.sign(1, Role::Student).expect("sign");
        let res = app
            .oneshot(
                Request::builder()
                    .uri("/instructor_students")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn register_login_weigh_in_and_delete_scenario() {
        let state = AppState::fake();

        let Json(registered) = register_student(
            State(state.clone()),
            Json(RegisterStudentRequest {
                name: "Ana".into(),
                surname: "Lee".into(),
                email: "a@x.com".into(),
                birth_date: date!(2000 - 01 - 01),
                height: 170.0,
                weight: 65.0,
                gender: "female".into(),
                goal_weight: 60.0,
                password: "s3cret-pass".into(),
            }),
        )
        .await
        .expect("register");
        assert_eq!(registered.code.len(), 6);

        let Json(session) = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "a@x.com".into(),
                password: "s3cret-pass".into(),
            }),
        )
        .await
        .expect("login");
        assert_eq!(session.role, Role::Student);
        let student_id = session.id;

        let Json(added) = add_weight(
            State(state.clone()),
            crate::auth::session::StudentSession(student_id),
            Json(AddWeightRequest { weight: 63.0 }),
        )
        .await
        .expect("second weigh-in");
        assert_eq!(added.record.weight, 63.0);

        let Json(dash) = dashboard(
            State(state.clone()),
            crate::auth::session::StudentSession(student_id),
        )
        .await
        .expect("dashboard");
        assert_eq!(dash.weight_records.len(), 2);
        let first_id = dash.weight_records[0].id;

        let err = delete_weight_record(
            State(state.clone()),
            crate::auth::session::StudentSession(student_id),
            Path(first_id),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let Json(deleted) = delete_weight_record(
            State(state.clone()),
            crate::auth::session::StudentSession(student_id),
            Path(added.record.id),
        )
        .await
        .expect("delete second record");
        assert!(deleted.deleted);
    }
}
