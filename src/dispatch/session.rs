use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    username: Option<String>,
}

/// Credentials shared by every command sent through a dispatcher.
///
/// Clones share the same state, so the login flow can hold one handle and
/// update it while dispatchers read from theirs.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<SessionState>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.set_token(token);
        session
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.write().token = Some(token.into());
    }

    pub fn set_username(&self, username: impl Into<String>) {
        self.write().username = Some(username.into());
    }

    /// Forgets every credential, as on logout.
    pub fn clear(&self) {
        let mut state = self.write();
        state.token = None;
        state.username = None;
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn username(&self) -> Option<String> {
        self.read().username.clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}
