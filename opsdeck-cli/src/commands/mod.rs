mod doctor;
mod keys;

pub use doctor::run_doctor;
pub use keys::run_keys;
