pub mod prelude;

pub mod actividad;
pub mod permisos;
pub mod roles;
pub mod usuarios;
