// Password reset by emailed 6-digit code.
// Flow: send-reset-code → (optional) verify-reset-code → reset-password.
// Codes are stored hashed, expire after a TTL, and die after too many misses.

pub mod code;
pub mod handlers;
pub mod mailer;
pub mod store;
