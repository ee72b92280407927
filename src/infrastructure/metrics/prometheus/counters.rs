use metrics::counter;

/// Increment the authentication counter for one outcome label.
pub fn increment_auth_attempt(outcome: &'static str) {
    counter!("auth_attempts_total", "outcome" => outcome).increment(1);
}

/// Increment a counter for users created on first login.
pub fn increment_user_created() {
    counter!("users_created_total").increment(1);
}
