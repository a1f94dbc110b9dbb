pub mod auth_service;
pub mod auth_service_impl;
pub mod notifier;
pub mod throttle;
pub mod token;

pub use auth_service::{AuthError, AuthService, LoginResult, UsuarioSummary};
pub use auth_service_impl::SeaOrmAuthService;
pub use notifier::{LogNotifier, Notifier, SmtpNotifier};
pub use token::{Claims, TokenService};
