//! Auth collaborator and the sign-in / sign-up / reset screen.

mod memory;
mod rest;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

pub use memory::MemoryAuth;
pub use rest::RestAuth;

use crate::error::{AuthError, Field, ScreenError};
use crate::i18n::Language;
use crate::notify::{self, Notice, NotificationSink};
use crate::session::{Identity, Session};

/// Outcome of a sign-up. `session` is only present when the service does
/// not require email confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUp {
    pub user: Identity,
    pub session: Option<Session>,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp, AuthError>;

    async fn send_password_reset(&self, email: &str, redirect_to: &str) -> Result<(), AuthError>;

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError>;

    async fn refresh(&self, session: &Session) -> Result<Session, AuthError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthView {
    #[default]
    Login,
    Signup,
    Reset,
}

impl AuthView {
    /// Login and Signup swap; Reset has no toggle.
    pub fn toggled(self) -> Self {
        match self {
            AuthView::Login => AuthView::Signup,
            AuthView::Signup => AuthView::Login,
            AuthView::Reset => AuthView::Reset,
        }
    }
}

pub struct AuthScreen {
    view: AuthView,
    lang: Language,
    loading: bool,
    email_banner: bool,
    reset_redirect: String,
    notices: Arc<dyn NotificationSink>,
}

impl AuthScreen {
    pub fn new(
        lang: Language,
        reset_redirect: impl Into<String>,
        notices: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            view: AuthView::default(),
            lang,
            loading: false,
            email_banner: false,
            reset_redirect: reset_redirect.into(),
            notices,
        }
    }

    pub fn view(&self) -> AuthView {
        self.view
    }

    pub fn language(&self) -> Language {
        self.lang
    }

    pub fn set_language(&mut self, lang: Language) {
        self.lang = lang;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the "confirm your email" banner is showing after a sign-up.
    pub fn shows_email_banner(&self) -> bool {
        self.email_banner
    }

    pub fn toggle_mode(&mut self) {
        self.view = self.view.toggled();
    }

    pub fn forgot_password(&mut self) {
        if self.view == AuthView::Login {
            self.view = AuthView::Reset;
        }
    }

    pub fn back_to_login(&mut self) {
        if self.view == AuthView::Reset {
            self.view = AuthView::Login;
        }
    }

    /// Submits the form of the current view. Returns the new session when the
    /// user ends up signed in.
    pub async fn submit(
        &mut self,
        auth: &dyn AuthProvider,
        email: &str,
        password: &str,
    ) -> Result<Option<Session>, ScreenError> {
        match self.view {
            AuthView::Login => self.login(auth, email, password).await.map(Some),
            AuthView::Signup => self.signup(auth, email, password).await,
            AuthView::Reset => self.request_reset(auth, email).await.map(|()| None),
        }
    }

    #[tracing::instrument(skip(self, auth, password))]
    async fn login(
        &mut self,
        auth: &dyn AuthProvider,
        email: &str,
        password: &str,
    ) -> Result<Session, ScreenError> {
        self.validate_credentials(email, password)?;
        let strings = self.lang.strings();

        self.loading = true;
        let result = auth.sign_in(email.trim(), password).await;
        self.loading = false;

        match result {
            Ok(session) => {
                info!(user = %session.user_id(), "signed in");
                self.notices.push(Notice::success(strings.login_success));
                Ok(session)
            }
            Err(AuthError::EmailNotConfirmed) => {
                warn!("sign-in refused, email not confirmed");
                self.notices.push(
                    Notice::error(strings.verify_email_first).lasting(notify::LONG),
                );
                Err(AuthError::EmailNotConfirmed.into())
            }
            Err(err) => {
                warn!(error = %err, "sign-in failed");
                self.push_auth_failure(&err);
                Err(err.into())
            }
        }
    }

    #[tracing::instrument(skip(self, auth, password))]
    async fn signup(
        &mut self,
        auth: &dyn AuthProvider,
        email: &str,
        password: &str,
    ) -> Result<Option<Session>, ScreenError> {
        self.validate_credentials(email, password)?;
        let strings = self.lang.strings();

        self.loading = true;
        let result = auth.sign_up(email.trim(), password).await;
        self.loading = false;

        match result {
            Ok(signup) => {
                info!(user = %signup.user.id, confirmed = signup.session.is_some(), "signed up");
                self.notices.push(
                    Notice::success(strings.signup_check_email).lasting(notify::EXTRA_LONG),
                );
                self.notices
                    .push(Notice::info(strings.spam_tip).lasting(notify::LONG));
                self.email_banner = true;
                Ok(signup.session)
            }
            Err(err) => {
                warn!(error = %err, "sign-up failed");
                self.push_auth_failure(&err);
                Err(err.into())
            }
        }
    }

    #[tracing::instrument(skip(self, auth))]
    async fn request_reset(
        &mut self,
        auth: &dyn AuthProvider,
        email: &str,
    ) -> Result<(), ScreenError> {
        let strings = self.lang.strings();
        if email.trim().is_empty() {
            self.notices.push(Notice::error(strings.email_required));
            return Err(ScreenError::Validation(Field::Email));
        }

        self.loading = true;
        let result = auth
            .send_password_reset(email.trim(), &self.reset_redirect)
            .await;
        self.loading = false;

        match result {
            Ok(()) => {
                self.notices.push(Notice::success(strings.reset_link_sent));
                self.view = AuthView::Login;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "password reset request failed");
                self.push_auth_failure(&err);
                Err(err.into())
            }
        }
    }

    fn validate_credentials(&self, email: &str, password: &str) -> Result<(), ScreenError> {
        let strings = self.lang.strings();
        if email.trim().is_empty() {
            self.notices.push(Notice::error(strings.email_required));
            return Err(ScreenError::Validation(Field::Email));
        }
        if password.is_empty() {
            self.notices.push(Notice::error(strings.password_required));
            return Err(ScreenError::Validation(Field::Password));
        }
        Ok(())
    }

    fn push_auth_failure(&self, err: &AuthError) {
        let message = err
            .service_message()
            .unwrap_or(self.lang.strings().error);
        self.notices.push(Notice::error(message));
    }
}

/// Signs out remotely. Local state is discarded by the caller whatever the
/// outcome, so a failure is only logged.
#[tracing::instrument(skip_all, fields(user = %session.user_id()))]
pub async fn sign_out(
    auth: &dyn AuthProvider,
    session: &Session,
    lang: Language,
    notices: &dyn NotificationSink,
) {
    if let Err(err) = auth.sign_out(session).await {
        warn!(error = %err, "remote sign-out failed");
    }
    notices.push(Notice::success(lang.strings().logged_out));
}

#[cfg(test)]
mod tests {
    use super::AuthView;

    #[test]
    fn login_and_signup_toggle_reset_does_not() {
        assert_eq!(AuthView::default(), AuthView::Login);
        assert_eq!(AuthView::Login.toggled(), AuthView::Signup);
        assert_eq!(AuthView::Signup.toggled(), AuthView::Login);
        assert_eq!(AuthView::Reset.toggled(), AuthView::Reset);
    }
}
