pub mod gate;
pub mod principal;

pub use gate::AccessGate;
pub use principal::{CrudOperation, FieldPermissions, ObjectPermissions, Principal};
