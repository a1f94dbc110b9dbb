use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use tablero::api::AppState;
use tablero::config::Config;
use tablero::services::{Notifier, TokenService};

/// Seed account created by the initial migration
const ADMIN_EMAIL: &str = "admin@tablero.local";
const ADMIN_PASSWORD: &str = "Admin1234";

/// Records deliveries instead of talking to an SMTP server
#[derive(Default)]
struct MockNotifier {
    sent: Mutex<Vec<(String, i32)>>,
}

impl MockNotifier {
    fn deliveries(&self) -> Vec<(String, i32)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send_reset_code(&self, to: &str, codigo: i32) -> Result<()> {
        self.sent.lock().unwrap().push((to.to_string(), codigo));
        Ok(())
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    // Keep hashing cheap in tests
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

async fn spawn_app() -> (Router, Arc<AppState>, Arc<MockNotifier>) {
    let notifier = Arc::new(MockNotifier::default());
    let state = tablero::api::create_app_state_with_notifier(test_config(), notifier.clone())
        .await
        .expect("Failed to create app state");
    (tablero::api::router(state.clone()), state, notifier)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            json!({"email": email, "password": password}),
        ))
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn login_returns_token_and_usuario() {
    let (app, _, _) = spawn_app().await;

    let (status, body) = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["usuario"]["email"], json!(ADMIN_EMAIL));
    assert_eq!(body["usuario"]["rol"], json!("admin"));
    assert!(body["usuario"]["id"].is_i64());

    let tokens = TokenService::new("change-me", 24);
    let claims = tokens.decode(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.email, ADMIN_EMAIL);
    assert_eq!(claims.rol, "admin");
}

#[tokio::test]
async fn login_requires_email_and_password() {
    let (app, _, _) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/api/auth/login", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Email y contraseña requeridos"));
}

#[tokio::test]
async fn login_rejects_unknown_user() {
    let (app, _, _) = spawn_app().await;

    let (status, body) = login(&app, "nadie@example.com", "Whatever1").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("Usuario no encontrado"));
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let (app, _, _) = spawn_app().await;

    let (status, body) = login(&app, ADMIN_EMAIL, "wrong-password").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("Contraseña incorrecta"));
}

#[tokio::test]
async fn login_treats_inactive_account_as_missing() {
    let (app, _, _) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/usuarios",
            json!({
                "nombre": "Paula",
                "email": "paula@example.com",
                "password": "Segura123",
                "rol": "instructor",
                "estado": "inactive"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = login(&app, "paula@example.com", "Segura123").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("Usuario no encontrado"));
}

#[tokio::test]
async fn recovery_flow_end_to_end() {
    let (app, _, notifier) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/forgot-password",
            json!({"email": ADMIN_EMAIL}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Código enviado al correo"));

    let deliveries = notifier.deliveries();
    assert_eq!(deliveries.len(), 1);
    let (to, codigo) = deliveries[0].clone();
    assert_eq!(to, ADMIN_EMAIL);
    assert!((100_000..=999_999).contains(&codigo));

    // Wrong code reads as invalid without consuming the real one
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/verify-code",
            json!({"email": ADMIN_EMAIL, "codigo": codigo + 1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Código inválido"));

    // Verification does not consume the code
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/verify-code",
                json!({"email": ADMIN_EMAIL, "codigo": codigo}),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["message"], json!("Código válido"));
    }

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/reset-password",
            json!({"email": ADMIN_EMAIL, "codigo": codigo, "nuevaPassword": "Renovada9"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Contraseña actualizada correctamente"));

    let (status, _) = login(&app, ADMIN_EMAIL, "Renovada9").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The code was cleared by the reset and cannot be replayed
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/reset-password",
            json!({"email": ADMIN_EMAIL, "codigo": codigo, "nuevaPassword": "Renovada10"}),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Código inválido"));
}

#[tokio::test]
async fn recovery_accepts_code_sent_as_string() {
    let (app, _, notifier) = spawn_app().await;

    app.clone()
        .oneshot(post_json(
            "/api/forgot-password",
            json!({"email": ADMIN_EMAIL}),
        ))
        .await
        .unwrap();

    let (_, codigo) = notifier.deliveries()[0].clone();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/verify-code",
            json!({"email": ADMIN_EMAIL, "codigo": codigo.to_string()}),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
}

#[tokio::test]
async fn recovery_reports_unknown_email_without_sending() {
    let (app, _, notifier) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/forgot-password",
            json!({"email": "nadie@example.com"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Usuario no encontrado"));
    assert!(notifier.deliveries().is_empty());
}

#[tokio::test]
async fn recovery_rejects_expired_code() {
    let (app, state, notifier) = spawn_app().await;

    app.clone()
        .oneshot(post_json(
            "/api/forgot-password",
            json!({"email": ADMIN_EMAIL}),
        ))
        .await
        .unwrap();

    let (_, codigo) = notifier.deliveries()[0].clone();

    // Rewind the expiry past the deadline
    let past = chrono::Utc::now() - chrono::Duration::minutes(16);
    state
        .store()
        .set_reset_code(ADMIN_EMAIL, codigo, past)
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/verify-code",
            json!({"email": ADMIN_EMAIL, "codigo": codigo}),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Código expirado"));

    // Reset is refused on the same grounds
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/reset-password",
            json!({"email": ADMIN_EMAIL, "codigo": codigo, "nuevaPassword": "Renovada9"}),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Código expirado"));
}

#[tokio::test]
async fn recovery_issuance_is_throttled_per_email() {
    let (app, _, _) = spawn_app().await;

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/forgot-password",
                json!({"email": ADMIN_EMAIL}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/forgot-password",
            json!({"email": ADMIN_EMAIL}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn change_password_validates_in_order() {
    let (app, _, _) = spawn_app().await;

    let cases = [
        (json!({}), "Todos los campos son requeridos"),
        (
            json!({"usuario_id": 1, "password_actual": "x", "password_nueva": "Ab1"}),
            "La contraseña debe tener al menos 8 caracteres",
        ),
        (
            json!({"usuario_id": 1, "password_actual": "x", "password_nueva": "minuscula1"}),
            "La contraseña debe tener al menos una letra mayúscula",
        ),
        (
            json!({"usuario_id": 1, "password_actual": "x", "password_nueva": "MAYUSCULA1"}),
            "La contraseña debe tener al menos una letra minúscula",
        ),
        (
            json!({"usuario_id": 1, "password_actual": "x", "password_nueva": "SinNumeros"}),
            "La contraseña debe tener al menos un número",
        ),
    ];

    for (payload, expected) in cases {
        let response = app
            .clone()
            .oneshot(post_json("/api/cambiar-password", payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], json!(expected));
    }
}

#[tokio::test]
async fn change_password_rejects_unknown_user() {
    let (app, _, _) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/cambiar-password",
            json!({"usuario_id": 999, "password_actual": "Admin1234", "password_nueva": "Renovada9"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("Usuario no encontrado"));
}

#[tokio::test]
async fn change_password_rejects_wrong_current() {
    let (app, _, _) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/cambiar-password",
            json!({"usuario_id": 1, "password_actual": "wrong", "password_nueva": "Renovada9"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("La contraseña actual es incorrecta"));
}

#[tokio::test]
async fn change_password_rejects_unchanged_password() {
    let (app, _, _) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/cambiar-password",
            json!({
                "usuario_id": 1,
                "password_actual": ADMIN_PASSWORD,
                "password_nueva": ADMIN_PASSWORD
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        json!("La nueva contraseña debe ser diferente a la actual")
    );
}

#[tokio::test]
async fn change_password_installs_new_credential() {
    let (app, _, _) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/cambiar-password",
            json!({
                "usuario_id": 1,
                "password_actual": ADMIN_PASSWORD,
                "password_nueva": "Renovada9"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], json!("Contraseña actualizada correctamente"));

    let (status, _) = login(&app, ADMIN_EMAIL, "Renovada9").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn activity_queries_cap_result_size() {
    let (app, state, _) = spawn_app().await;

    for i in 0..12 {
        state
            .store()
            .record_actividad(1, Some("login"), &format!("Inicio de sesión {i}"), Some("auth"))
            .await
            .unwrap();
    }

    // Per-user history returns at most 10 entries
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/actividad/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["actividad"].as_array().unwrap().len(), 10);

    // The dashboard shows the 5 most recent
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/dashboard/data")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["actividad_reciente"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn login_records_activity() {
    let (app, _, _) = spawn_app().await;

    let (status, _) = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/actividad/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    let entries = body["actividad"].as_array().unwrap();
    assert!(!entries.is_empty());
    assert_eq!(entries[0]["tipo"], json!("login"));
    assert_eq!(entries[0]["usuario_id"], json!(1));
}
