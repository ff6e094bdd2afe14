use crate::analysis::{analyze, SessionAnalysis};
use crate::error::ApiError;
use crate::session::{NewSession, TypingSession};
use crate::store::SessionStore;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// An already-authenticated requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn can_access(&self, owner_id: &str) -> bool {
        self.user_id == owner_id || self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionWithAnalysis {
    pub session: TypingSession,
    pub analysis: SessionAnalysis,
}

/// Session handlers over an injected store.
#[derive(Debug)]
pub struct SessionService<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> SessionService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn create_session(
        &self,
        caller: &Caller,
        new: NewSession,
    ) -> Result<TypingSession, ApiError> {
        new.validate().map_err(|e| {
            warn!(user = %caller.user_id, "rejected session: {e}");
            e
        })?;

        let session = self.store.insert(&caller.user_id, new).map_err(|e| {
            error!(user = %caller.user_id, "failed to store session: {e}");
            e
        })?;

        info!(
            user = %caller.user_id,
            session_id = session.id,
            wpm = session.wpm,
            accuracy = session.accuracy,
            "stored typing session"
        );
        Ok(session)
    }

    pub fn user_sessions(
        &self,
        caller: &Caller,
        user_id: &str,
    ) -> Result<Vec<TypingSession>, ApiError> {
        if !caller.can_access(user_id) {
            warn!(caller = %caller.user_id, owner = %user_id, "denied session listing");
            return Err(ApiError::Forbidden("Not authorized to access these sessions"));
        }

        Ok(self.store.find_by_user(user_id)?)
    }

    pub fn session_analysis(
        &self,
        caller: &Caller,
        session_id: i64,
    ) -> Result<SessionWithAnalysis, ApiError> {
        let Some(session) = self.store.find_by_id(session_id)? else {
            warn!(session_id, "analysis requested for missing session");
            return Err(ApiError::NotFound);
        };

        if !caller.can_access(&session.user_id) {
            warn!(caller = %caller.user_id, session_id, "denied session analysis");
            return Err(ApiError::Forbidden("Not authorized to access this session"));
        }

        let analysis = analyze(&session);
        Ok(SessionWithAnalysis { session, analysis })
    }
}

/// A handler outcome in the shape returned over HTTP.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok<T: Serialize>(status: u16, data: &T) -> Self {
        Self::from_value(status, serde_json::to_value(data), None)
    }

    pub fn list<T: Serialize>(items: &[T]) -> Self {
        Self::from_value(200, serde_json::to_value(items), Some(items.len()))
    }

    pub fn failure(err: &ApiError) -> Self {
        Self {
            status: err.status(),
            body: json!({ "success": false, "error": err.to_string() }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn from_value(status: u16, data: serde_json::Result<Value>, count: Option<usize>) -> Self {
        match data {
            Ok(data) => {
                let mut body = json!({ "success": true, "data": data });
                if let Some(count) = count {
                    body["count"] = json!(count);
                }
                Self { status, body }
            }
            Err(e) => Self {
                status: 500,
                body: json!({ "success": false, "error": e.to_string() }),
            },
        }
    }
}

impl From<Result<TypingSession, ApiError>> for ApiResponse {
    fn from(result: Result<TypingSession, ApiError>) -> Self {
        match result {
            Ok(session) => ApiResponse::ok(201, &session),
            Err(e) => ApiResponse::failure(&e),
        }
    }
}

impl From<Result<Vec<TypingSession>, ApiError>> for ApiResponse {
    fn from(result: Result<Vec<TypingSession>, ApiError>) -> Self {
        match result {
            Ok(sessions) => ApiResponse::list(&sessions),
            Err(e) => ApiResponse::failure(&e),
        }
    }
}

impl From<Result<SessionWithAnalysis, ApiError>> for ApiResponse {
    fn from(result: Result<SessionWithAnalysis, ApiError>) -> Self {
        match result {
            Ok(found) => ApiResponse::ok(200, &found),
            Err(e) => ApiResponse::failure(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{TestDuration, TextType};
    use crate::store::SqliteSessionStore;
    use assert_matches::assert_matches;

    fn service() -> SessionService<SqliteSessionStore> {
        SessionService::new(SqliteSessionStore::open_in_memory().unwrap())
    }

    fn new_session() -> NewSession {
        NewSession {
            duration: TestDuration::Fifteen,
            wpm: 60.0,
            accuracy: 85.0,
            total_errors: 2,
            error_words: vec!["cat".to_string()],
            typing_durations: vec![50.0, 200.0, 52.0, 48.0],
            text_type: TextType::Words,
            raw_text: "the cat sat".to_string(),
            typed_text: "the car sat".to_string(),
        }
    }

    #[test]
    fn caller_access_rules() {
        assert!(Caller::new("a", Role::User).can_access("a"));
        assert!(!Caller::new("a", Role::User).can_access("b"));
        assert!(Caller::new("root", Role::Admin).can_access("b"));
    }

    #[test]
    fn create_assigns_caller_as_owner() {
        let svc = service();
        let alice = Caller::new("alice", Role::User);
        let session = svc.create_session(&alice, new_session()).unwrap();
        assert_eq!(session.user_id, "alice");

        let response = ApiResponse::from(Ok(session));
        assert_eq!(response.status, 201);
        assert_eq!(response.body["data"]["userId"], "alice");
    }

    #[test]
    fn create_rejects_invalid_payload() {
        let svc = service();
        let mut new = new_session();
        new.accuracy = -3.0;
        let err = svc
            .create_session(&Caller::new("alice", Role::User), new)
            .unwrap_err();
        assert_matches!(err, ApiError::Invalid(_));
        assert!(svc.store().find_by_user("alice").unwrap().is_empty());
    }

    #[test]
    fn listing_other_users_sessions_is_forbidden() {
        let svc = service();
        let alice = Caller::new("alice", Role::User);
        svc.create_session(&alice, new_session()).unwrap();

        let bob = Caller::new("bob", Role::User);
        let err = svc.user_sessions(&bob, "alice").unwrap_err();
        assert_matches!(err, ApiError::Forbidden(_));

        let response = ApiResponse::failure(&err);
        assert_eq!(response.status, 403);
        assert_eq!(response.body["success"], false);
        assert_eq!(
            response.body["error"],
            "Not authorized to access these sessions"
        );
    }

    #[test]
    fn admin_lists_any_user_with_count() {
        let svc = service();
        let alice = Caller::new("alice", Role::User);
        svc.create_session(&alice, new_session()).unwrap();
        svc.create_session(&alice, new_session()).unwrap();

        let admin = Caller::new("root", Role::Admin);
        let response = ApiResponse::from(svc.user_sessions(&admin, "alice"));
        assert_eq!(response.status, 200);
        assert_eq!(response.body["count"], 2);
        assert_eq!(response.body["data"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn analysis_of_missing_session_is_not_found() {
        let svc = service();
        let err = svc
            .session_analysis(&Caller::new("alice", Role::User), 99)
            .unwrap_err();
        assert_matches!(err, ApiError::NotFound);
        assert_eq!(ApiResponse::failure(&err).status, 404);
    }

    #[test]
    fn analysis_checks_ownership() {
        let svc = service();
        let alice = Caller::new("alice", Role::User);
        let session = svc.create_session(&alice, new_session()).unwrap();

        let err = svc
            .session_analysis(&Caller::new("bob", Role::User), session.id)
            .unwrap_err();
        assert_matches!(err, ApiError::Forbidden("Not authorized to access this session"));

        assert!(svc
            .session_analysis(&Caller::new("root", Role::Admin), session.id)
            .is_ok());
    }

    #[test]
    fn analysis_envelope() {
        let svc = service();
        let alice = Caller::new("alice", Role::User);
        let session = svc.create_session(&alice, new_session()).unwrap();

        let response = ApiResponse::from(svc.session_analysis(&alice, session.id));
        assert_eq!(response.status, 200);
        assert_eq!(response.body["success"], true);

        let data = &response.body["data"];
        assert_eq!(data["session"]["id"], session.id);
        let patterns = &data["analysis"]["errorPatterns"];
        assert_eq!(patterns["commonErrorWords"][0]["word"], "cat");
        assert_eq!(patterns["speedTrend"], "consistent");
        assert_eq!(patterns["totalErrors"], 2);
        assert_eq!(patterns["accuracy"], 85.0);
        let insights = &data["analysis"]["psychologicalInsights"];
        assert_eq!(insights["impulsivity"], "high");
        assert_eq!(insights["pressureResponse"], "affected by time pressure");
        assert_eq!(insights["resilience"], "high");
    }
}
