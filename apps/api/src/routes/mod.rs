pub mod health;
pub mod preferences;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::state::AppState;
use crate::{auth, cv, extraction, letters, navigation};

/// Room for the multipart framing around an upload at the size limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/health", get(health::health_handler))
        // Extraction
        .route(
            "/api/v1/cv/extract",
            post(extraction::handlers::handle_extract),
        )
        .route(
            "/api/v1/cv/extract/confirm",
            post(extraction::handlers::handle_extract_confirm),
        )
        // CV builder
        .route(
            "/api/v1/cv",
            get(cv::handlers::handle_get_cv).put(cv::handlers::handle_save_cv),
        )
        .route("/api/v1/cv/draft", put(cv::handlers::handle_stage_draft))
        .route(
            "/api/v1/cv/draft/flush",
            post(cv::handlers::handle_flush_draft),
        )
        .route(
            "/api/v1/cv/:section/entries",
            post(cv::handlers::handle_add_entry),
        )
        .route(
            "/api/v1/cv/:section/entries/:id",
            delete(cv::handlers::handle_remove_entry),
        )
        .route(
            "/api/v1/cv/steps/:step",
            get(cv::handlers::handle_validate_step),
        )
        .route(
            "/api/v1/cv/template",
            put(cv::handlers::handle_select_template),
        )
        .route("/api/v1/templates", get(cv::handlers::handle_list_templates))
        .route("/api/v1/cv/preview", get(cv::handlers::handle_preview))
        .route("/api/v1/cv/export", post(cv::handlers::handle_export))
        // Letters
        .route(
            "/api/v1/letters",
            get(letters::handlers::handle_list_letters)
                .post(letters::handlers::handle_generate_letter),
        )
        .route(
            "/api/v1/letters/current",
            get(letters::handlers::handle_current_letter),
        )
        .route(
            "/api/v1/letters/:id",
            get(letters::handlers::handle_get_letter)
                .put(letters::handlers::handle_update_letter)
                .delete(letters::handlers::handle_delete_letter),
        )
        .route(
            "/api/v1/letters/:id/export",
            post(letters::handlers::handle_export_letter),
        )
        // Accounts
        .route(
            "/api/v1/auth/register",
            post(auth::handlers::handle_register),
        )
        .route("/api/v1/auth/login", post(auth::handlers::handle_login))
        .route("/api/v1/auth/logout", post(auth::handlers::handle_logout))
        .route("/api/v1/auth/session", get(auth::handlers::handle_session))
        .route(
            "/api/v1/auth/profile",
            patch(auth::handlers::handle_update_profile),
        )
        .route(
            "/api/v1/auth/password",
            post(auth::handlers::handle_change_password),
        )
        .route(
            "/api/v1/auth/reset",
            post(auth::handlers::handle_reset_password),
        )
        .route(
            "/api/v1/auth/account",
            delete(auth::handlers::handle_delete_account),
        )
        // Preferences and navigation
        .route(
            "/api/v1/preferences",
            get(preferences::handle_get_preferences).put(preferences::handle_put_preferences),
        )
        .route(
            "/api/v1/navigation",
            get(navigation::handlers::handle_get_location)
                .post(navigation::handlers::handle_navigate),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn router() -> Router {
        build_router(AppState::for_tests())
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(empty_request("GET", "/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["service"], "cvstudio-api");
    }

    #[tokio::test]
    async fn test_builder_flow() {
        let app = router();

        let response = app
            .clone()
            .oneshot(empty_request("GET", "/api/v1/cv"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cv = body_json(response).await;
        assert_eq!(cv["skills"].as_array().unwrap().len(), 1);

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/v1/cv",
                json!({
                    "personalInfo": {
                        "firstName": "Awa",
                        "lastName": "Diallo",
                        "email": "awa@mail.ne",
                        "phone": "+227 90 00 00 00",
                        "city": "Niamey"
                    }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(empty_request("GET", "/api/v1/cv/steps/1"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["valid"], true);

        let response = app
            .clone()
            .oneshot(empty_request("POST", "/api/v1/cv/skills/entries"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["cv"]["skills"].as_array().unwrap().len(), 2);

        let response = app
            .clone()
            .oneshot(empty_request("POST", "/api/v1/cv/hobbies/entries"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(empty_request("GET", "/api/v1/cv/preview?template=classique"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(empty_request("POST", "/api/v1/cv/export"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("CV_Awa_Diallo"));
        let pages: usize = response.headers()["x-export-pages"]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!(pages >= 1);
        let quality: u8 = response.headers()["x-export-quality"]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!((50..=85).contains(&quality));
    }

    #[tokio::test]
    async fn test_letter_without_cv_is_missing_data() {
        let response = router()
            .oneshot(json_request(
                "POST",
                "/api/v1/letters",
                json!({
                    "jobTitle": "Comptable",
                    "companyName": "Sonidep",
                    "jobDescription": "Tenue des comptes",
                    "sector": "Énergie",
                    "applicationType": "offre"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "MISSING_DATA");
    }

    #[tokio::test]
    async fn test_empty_handoff_slot_is_not_found() {
        let response = router()
            .oneshot(empty_request("GET", "/api/v1/letters/current"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_guarded_navigation_returns_after_login() {
        let app = router();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/navigation",
                json!({ "route": "create-letter" }),
            ))
            .await
            .unwrap();
        let location = body_json(response).await;
        assert_eq!(location["route"], "login");
        assert_eq!(location["fragment"], "login?returnTo=create-letter");

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/auth/register",
                json!({
                    "firstName": "Awa",
                    "lastName": "Diallo",
                    "email": "awa@mail.ne",
                    "password": "secret42",
                    "confirmPassword": "secret42",
                    "acceptTerms": true
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let session = body_json(response).await;
        assert_eq!(session["isAuthenticated"], true);
        assert_eq!(session["redirect"], "create-letter");
        assert!(session["user"].get("passwordHash").is_none());

        let response = app
            .clone()
            .oneshot(empty_request("POST", "/api/v1/auth/logout"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/auth/login",
                json!({ "email": "awa@mail.ne", "password": "wrong-one" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_preferences_stamp_last_visit() {
        let response = router()
            .oneshot(json_request(
                "PUT",
                "/api/v1/preferences",
                json!({ "theme": "dark", "language": "en" }),
            ))
            .await
            .unwrap();
        let prefs = body_json(response).await;
        assert_eq!(prefs["theme"], "dark");
        assert!(prefs["lastVisit"].is_string());
    }
}
