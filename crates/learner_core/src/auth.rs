//! crates/learner_core/src/auth.rs
//!
//! Learner login over the persistence service. Administrator identity
//! acquisition happens outside the core; adapters only need a credentials
//! slot they can swap on login.

use crate::ports::{PersistenceService, PortError, PortResult};

/// Logs a learner in by name and returns the canonical (trimmed) name to
/// key sessions with.
pub async fn login(store: &dyn PersistenceService, user_name: &str) -> PortResult<String> {
    let name = user_name.trim();
    if name.is_empty() {
        return Err(PortError::InvalidInput(
            "a name is required to log in".to_string(),
        ));
    }
    if store.login_user(name).await? {
        Ok(name.to_string())
    } else {
        Err(PortError::Service("login was rejected".to_string()))
    }
}
