pub use super::actividad::Entity as Actividad;
pub use super::permisos::Entity as Permisos;
pub use super::roles::Entity as Roles;
pub use super::usuarios::Entity as Usuarios;
