use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::warn;

use crate::config::Config;
use crate::db::Store;
use crate::db::repositories::user::verify_password;
use crate::services::auth_service::{
    AuthError, AuthService, LoginResult, UsuarioSummary, check_password_policy,
    generate_reset_code,
};
use crate::services::notifier::Notifier;
use crate::services::throttle::ResetThrottle;
use crate::services::token::TokenService;

pub struct SeaOrmAuthService {
    store: Store,
    tokens: TokenService,
    notifier: Arc<dyn Notifier>,
    throttle: ResetThrottle,
    config: Config,
}

impl SeaOrmAuthService {
    pub fn new(store: Store, notifier: Arc<dyn Notifier>, config: Config) -> Self {
        let tokens = TokenService::new(&config.auth.jwt_secret, config.auth.token_ttl_hours);
        let throttle = ResetThrottle::new(&config.auth.reset_throttle);
        Self {
            store,
            tokens,
            notifier,
            throttle,
            config,
        }
    }

    async fn verify_blocking(password: String, hash: String) -> Result<bool, AuthError> {
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .map_err(AuthError::from)
    }

    /// Audit writes never fail the request that triggered them
    async fn audit(&self, usuario_id: i32, tipo: &str, descripcion: &str) {
        if let Err(e) = self
            .store
            .record_actividad(usuario_id, Some(tipo), descripcion, Some("auth"))
            .await
        {
            warn!("Failed to record activity for user {usuario_id}: {e}");
        }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        let Some((usuario, hash)) = self.store.get_active_usuario_with_hash(email).await? else {
            return Err(AuthError::NotFound);
        };

        if !Self::verify_blocking(password.to_string(), hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(usuario.id, &usuario.email, &usuario.rol)?;

        self.audit(usuario.id, "login", "Inicio de sesión").await;

        Ok(LoginResult {
            token,
            usuario: UsuarioSummary {
                id: usuario.id,
                nombre: usuario.nombre,
                email: usuario.email,
                rol: usuario.rol,
            },
        })
    }

    async fn request_reset(&self, email: &str) -> Result<(), AuthError> {
        if !self.throttle.allow(email) {
            return Err(AuthError::Throttled);
        }

        let Some(usuario) = self.store.get_usuario_by_email(email).await? else {
            return Err(AuthError::NotFound);
        };

        let codigo = generate_reset_code();
        let expira = Utc::now() + Duration::minutes(self.config.auth.reset_code_ttl_minutes);

        self.store.set_reset_code(&usuario.email, codigo, expira).await?;

        // Delivery failure must not reveal anything to the caller; the code
        // is already persisted and a retry will reissue it.
        if let Err(e) = self.notifier.send_reset_code(&usuario.email, codigo).await {
            warn!("Failed to deliver reset code to {}: {e}", usuario.email);
        }

        self.audit(usuario.id, "reset_request", "Solicitud de código de recuperación")
            .await;

        Ok(())
    }

    async fn verify_code(&self, email: &str, codigo: i32) -> Result<(), AuthError> {
        let Some(state) = self.store.reset_state(email).await? else {
            return Err(AuthError::NotFound);
        };

        // Code match is checked before expiry so a stale wrong code still
        // reads as invalid, not expired
        if state.code != Some(codigo) {
            return Err(AuthError::InvalidCode);
        }

        match state.expira {
            Some(expira) if expira > Utc::now() => Ok(()),
            _ => Err(AuthError::ExpiredCode),
        }
    }

    async fn reset_password(
        &self,
        email: &str,
        codigo: i32,
        nueva_password: &str,
    ) -> Result<(), AuthError> {
        self.verify_code(email, codigo).await?;

        // Conditional update: the code is cleared in the same statement that
        // installs the hash, so a concurrent reset with the same code loses
        let rows = self
            .store
            .consume_reset_code(email, codigo, nueva_password, &self.config.security)
            .await?;
        if rows == 0 {
            return Err(AuthError::InvalidCode);
        }

        if let Ok(Some(usuario)) = self.store.get_usuario_by_email(email).await {
            self.audit(usuario.id, "reset", "Contraseña restablecida por código")
                .await;
        }

        Ok(())
    }

    async fn change_password(
        &self,
        usuario_id: i32,
        password_actual: &str,
        password_nueva: &str,
    ) -> Result<(), AuthError> {
        check_password_policy(password_nueva)?;

        let Some((usuario, hash)) = self.store.get_usuario_with_hash(usuario_id).await? else {
            return Err(AuthError::NotFound);
        };

        if !Self::verify_blocking(password_actual.to_string(), hash).await? {
            return Err(AuthError::WrongCurrentPassword);
        }

        if password_nueva == password_actual {
            return Err(AuthError::PasswordUnchanged);
        }

        self.store
            .update_password(usuario.id, password_nueva, &self.config.security)
            .await?;

        self.audit(usuario.id, "password_change", "Cambio de contraseña")
            .await;

        Ok(())
    }
}
