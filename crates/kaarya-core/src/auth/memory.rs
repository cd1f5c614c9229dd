use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use super::{AuthProvider, SignUp};
use crate::error::AuthError;
use crate::session::{Identity, Session};

#[derive(Debug, Clone)]
struct Account {
    id: Uuid,
    password: String,
    confirmed: bool,
}

/// In-memory auth service for tests. New accounts stay unconfirmed until
/// [`MemoryAuth::confirm`] is called, unless built with `auto_confirm`.
#[derive(Debug, Default)]
pub struct MemoryAuth {
    accounts: Mutex<HashMap<String, Account>>,
    resets: Mutex<Vec<(String, String)>>,
    calls: AtomicUsize,
    auto_confirm: bool,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auto_confirm() -> Self {
        Self {
            auto_confirm: true,
            ..Self::default()
        }
    }

    pub fn add_account(&self, email: &str, password: &str, confirmed: bool) -> Uuid {
        let id = Uuid::new_v4();
        self.accounts.lock().insert(
            email.to_ascii_lowercase(),
            Account {
                id,
                password: password.to_string(),
                confirmed,
            },
        );
        id
    }

    pub fn confirm(&self, email: &str) {
        if let Some(account) = self.accounts.lock().get_mut(&email.to_ascii_lowercase()) {
            account.confirmed = true;
        }
    }

    /// `(email, redirect)` pairs of every reset link sent.
    pub fn sent_resets(&self) -> Vec<(String, String)> {
        self.resets.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn issue(id: Uuid, email: &str) -> Session {
        Session {
            user: Identity {
                id,
                email: email.to_string(),
            },
            access_token: Uuid::new_v4().to_string(),
            refresh_token: Some(Uuid::new_v4().to_string()),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        }
    }
}

fn invalid_credentials() -> AuthError {
    AuthError::Rejected {
        status: 400,
        message: "Invalid login credentials".to_string(),
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let accounts = self.accounts.lock();
        let account = accounts
            .get(&email.to_ascii_lowercase())
            .filter(|account| account.password == password)
            .ok_or_else(invalid_credentials)?;
        if !account.confirmed {
            return Err(AuthError::EmailNotConfirmed);
        }
        Ok(Self::issue(account.id, email))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if password.chars().count() < 6 {
            return Err(AuthError::Rejected {
                status: 422,
                message: "Password should be at least 6 characters.".to_string(),
            });
        }

        let key = email.to_ascii_lowercase();
        let mut accounts = self.accounts.lock();
        if accounts.contains_key(&key) {
            return Err(AuthError::Rejected {
                status: 422,
                message: "User already registered".to_string(),
            });
        }

        let id = Uuid::new_v4();
        accounts.insert(
            key,
            Account {
                id,
                password: password.to_string(),
                confirmed: self.auto_confirm,
            },
        );

        let user = Identity {
            id,
            email: email.to_string(),
        };
        let session = self.auto_confirm.then(|| Self::issue(id, email));
        Ok(SignUp { user, session })
    }

    async fn send_password_reset(&self, email: &str, redirect_to: &str) -> Result<(), AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.resets
            .lock()
            .push((email.to_string(), redirect_to.to_string()));
        Ok(())
    }

    async fn sign_out(&self, _session: &Session) -> Result<(), AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn refresh(&self, session: &Session) -> Result<Session, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if session.refresh_token.is_none() {
            return Err(AuthError::Rejected {
                status: 400,
                message: "Refresh Token Not Found".to_string(),
            });
        }
        Ok(Self::issue(session.user.id, &session.user.email))
    }
}
