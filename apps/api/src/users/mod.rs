pub mod handlers;
pub mod preferences;
