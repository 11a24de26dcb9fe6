use chrono::{DateTime, Utc};

/// Authenticated session handed to the flow at construction.
///
/// Created once at app start (after login) and dropped at logout; the flow
/// never reads ambient global state for identity.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_id: i64,
    auth_token: String,
    pub issued_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn new(user_id: i64, auth_token: impl Into<String>) -> Self {
        Self {
            user_id,
            auth_token: auth_token.into(),
            issued_at: Utc::now(),
        }
    }

    pub fn bearer_token(&self) -> &str {
        &self.auth_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_identity_and_token() {
        let session = SessionContext::new(42, "tok_abc");
        assert_eq!(session.user_id, 42);
        assert_eq!(session.bearer_token(), "tok_abc");
    }
}
