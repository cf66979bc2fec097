//! Admin module - account deletion reporting and support operations.

mod deletion;

pub use deletion::{
    validate_new_password, DeletionReport, IdentityDeletion, TableDeletion, UserDataTable,
    MIN_PASSWORD_LENGTH,
};
