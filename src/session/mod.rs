mod auth;
mod store;

pub use auth::{
    force_logout, load_profile, refresh, register, sign_in, sign_out, validate_registration,
};
pub use store::{Session, SessionStore};
