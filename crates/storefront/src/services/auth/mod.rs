//! Authentication service.
//!
//! A reducer-driven session holding the signed-in demo user. Sign-in checks
//! an in-memory [`UserDirectory`]; each network-shaped call waits out a
//! configurable delay first. The current user is written to storage after
//! every change and removed on logout.

mod directory;
mod error;

pub use directory::{DemoAccount, UserDirectory};
pub use error::{AuthError, SignupField};

use std::sync::Arc;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, instrument, warn};

use shophub_core::{Email, UserId};

use crate::config::{LatencyConfig, simulate_latency};
use crate::models::user::{ProfileUpdate, User};
use crate::services::random_base36;
use crate::services::validation::FieldErrors;
use crate::storage::{self, KeyValueStore, keys};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Length of generated user IDs.
const USER_ID_LENGTH: usize = 9;

/// Authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    user: Option<User>,
    is_authenticated: bool,
    is_loading: bool,
}

impl Default for AuthState {
    /// Not yet rehydrated: no user, loading.
    fn default() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: true,
        }
    }
}

impl AuthState {
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    /// Whether an async operation (or the initial restore) is in flight.
    ///
    /// An [`AuthStore`] is exclusively borrowed while a request runs, so
    /// through the store this reads `false` between calls.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Apply an action.
    pub fn apply(&mut self, action: AuthAction) {
        match action {
            AuthAction::LoginStart | AuthAction::SignupStart => {
                self.is_loading = true;
            }
            AuthAction::LoginSuccess(user)
            | AuthAction::SignupSuccess(user)
            | AuthAction::ProfileUpdated(user) => {
                self.user = Some(user);
                self.is_authenticated = true;
                self.is_loading = false;
            }
            AuthAction::LoginFailure | AuthAction::SignupFailure | AuthAction::Logout => {
                self.user = None;
                self.is_authenticated = false;
                self.is_loading = false;
            }
            AuthAction::Restore(user) => {
                self.is_authenticated = user.is_some();
                self.user = user;
                self.is_loading = false;
            }
        }
    }
}

/// Auth state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAction {
    LoginStart,
    LoginSuccess(User),
    /// Clears any current user.
    LoginFailure,
    SignupStart,
    SignupSuccess(User),
    /// Clears any current user.
    SignupFailure,
    Logout,
    ProfileUpdated(User),
    /// Rehydrate from storage.
    Restore(Option<User>),
}

/// Signup details.
#[derive(Debug, Clone)]
pub struct SignupForm {
    pub email: String,
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

impl SignupForm {
    /// Check every field, returning the parsed email when all are valid.
    ///
    /// # Errors
    ///
    /// Returns the message for each invalid field.
    pub fn validate(&self) -> Result<Email, FieldErrors<SignupField>> {
        let mut errors = FieldErrors::new();

        if self.first_name.trim().is_empty() {
            errors.add(SignupField::FirstName, "First name is required");
        }
        if self.last_name.trim().is_empty() {
            errors.add(SignupField::LastName, "Last name is required");
        }

        let email = Email::parse(&self.email);
        if let Err(e) = &email {
            errors.add(SignupField::Email, e.to_string());
        }

        if self.password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                SignupField::Password,
                format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
            );
        }

        match email {
            Ok(email) if errors.is_empty() => Ok(email),
            _ => Err(errors),
        }
    }
}

/// The persisted demo session.
pub struct AuthStore {
    state: AuthState,
    directory: UserDirectory,
    latency: LatencyConfig,
    storage: Arc<dyn KeyValueStore>,
}

impl AuthStore {
    /// Restore the signed-in user from storage.
    ///
    /// An unreadable user document is treated as signed out.
    #[must_use]
    pub fn load(
        storage: Arc<dyn KeyValueStore>,
        directory: UserDirectory,
        latency: LatencyConfig,
    ) -> Self {
        let user = match storage::read_json::<User>(storage.as_ref(), keys::USER) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Error loading user from storage");
                None
            }
        };
        if let Some(user) = &user {
            debug!(user_id = %user.id, "Restored signed-in user");
        }

        let mut state = AuthState::default();
        state.apply(AuthAction::Restore(user));

        Self {
            state,
            directory,
            latency,
            storage,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &AuthState {
        &self.state
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.state.user()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    #[must_use]
    pub const fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    /// Sign in with email and password.
    ///
    /// A failed attempt signs out any current user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if no account matches.
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, email: &str, password: &str) -> Result<User, AuthError> {
        let mut pending = self.begin(AuthAction::LoginStart);
        simulate_latency(pending.store.latency.login).await;

        let Some(user) = pending.store.directory.authenticate(email, password).cloned() else {
            info!("Login failed");
            pending.store.dispatch(AuthAction::LoginFailure);
            return Err(AuthError::InvalidCredentials);
        };

        info!(user_id = %user.id, "Login successful");
        pending.store.dispatch(AuthAction::LoginSuccess(user.clone()));
        Ok(user)
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the form is invalid (state is left
    /// untouched) or `AuthError::UserAlreadyExists` if the email is taken.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn signup(&mut self, form: SignupForm) -> Result<User, AuthError> {
        let email = form.validate().map_err(AuthError::Validation)?;

        let mut pending = self.begin(AuthAction::SignupStart);
        simulate_latency(pending.store.latency.signup).await;

        if pending.store.directory.contains(&email) {
            info!("Signup rejected, email already registered");
            pending.store.dispatch(AuthAction::SignupFailure);
            return Err(AuthError::UserAlreadyExists);
        }

        let user = User {
            id: UserId::new(random_base36(USER_ID_LENGTH)),
            email,
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            phone: form.phone.filter(|p| !p.trim().is_empty()),
            avatar: None,
            joined_date: Utc::now().date_naive(),
        };
        pending.store.directory.register(user.clone(), form.password);

        info!(user_id = %user.id, "Account created");
        pending.store.dispatch(AuthAction::SignupSuccess(user.clone()));
        Ok(user)
    }

    /// Sign out.
    pub fn logout(&mut self) {
        if let Some(user) = self.state.user() {
            info!(user_id = %user.id, "Logged out");
        }
        self.dispatch(AuthAction::Logout);
    }

    /// Merge changes into the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` if nobody is signed in.
    #[instrument(skip_all)]
    pub async fn update_profile(&mut self, update: ProfileUpdate) -> Result<User, AuthError> {
        let Some(mut user) = self.state.user().cloned() else {
            return Err(AuthError::NotAuthenticated);
        };

        simulate_latency(self.latency.profile_update).await;

        update.apply_to(&mut user);
        debug!(user_id = %user.id, "Profile updated");
        self.dispatch(AuthAction::ProfileUpdated(user.clone()));
        Ok(user)
    }

    /// Start an async request, marking the state as loading until the
    /// returned guard is dropped.
    fn begin(&mut self, start: AuthAction) -> Pending<'_> {
        self.dispatch(start);
        Pending { store: self }
    }

    /// Apply an action and persist the resulting user.
    fn dispatch(&mut self, action: AuthAction) {
        let persist = !matches!(action, AuthAction::LoginStart | AuthAction::SignupStart);
        self.state.apply(action);
        if persist {
            self.persist();
        }
    }

    fn persist(&self) {
        let result = match self.state.user() {
            Some(user) => storage::write_json(self.storage.as_ref(), keys::USER, user),
            None => self.storage.remove(keys::USER),
        };
        if let Err(e) = result {
            warn!(error = %e, "Error saving user to storage");
        }
    }
}

/// An in-flight login or signup.
///
/// A request that finishes settles the state itself; one whose future is
/// dropped mid-wait leaves the user as it was and clears the loading flag.
struct Pending<'a> {
    store: &'a mut AuthStore,
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if self.store.state.is_loading {
            debug!("Auth request cancelled");
            self.store.state.is_loading = false;
        }
    }
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("state", &self.state)
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store_with(storage: &Arc<dyn KeyValueStore>) -> AuthStore {
        AuthStore::load(
            Arc::clone(storage),
            UserDirectory::demo(),
            LatencyConfig::none(),
        )
    }

    fn signup_form(email: &str) -> SignupForm {
        SignupForm {
            email: email.to_string(),
            password: SecretString::from("hunter22".to_string()),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: None,
        }
    }

    #[test]
    fn test_initial_state_is_loading() {
        let state = AuthState::default();
        assert!(state.is_loading());
        assert!(!state.is_authenticated());
        assert!(state.user().is_none());
    }

    #[test]
    fn test_load_without_saved_user_is_signed_out_and_settled() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let auth = store_with(&storage);
        assert!(!auth.is_authenticated());
        assert!(!auth.state().is_loading());
    }

    #[test]
    fn test_corrupt_saved_user_loads_signed_out() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        storage.set(keys::USER, "{\"id\":").unwrap();
        let auth = store_with(&storage);
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_with_demo_credentials() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut auth = store_with(&storage);

        let user = auth.login("demo@shophub.com", "demo123").await.unwrap();
        assert_eq!(user.first_name, "Demo");
        assert!(auth.is_authenticated());
        assert!(!auth.state().is_loading());

        let restored = store_with(&storage);
        assert_eq!(restored.user(), Some(&user));
    }

    #[tokio::test]
    async fn test_cancelled_login_clears_loading_and_keeps_user() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut auth = store_with(&storage);
        let user = auth.login("demo@shophub.com", "demo123").await.unwrap();
        auth.latency = LatencyConfig::default();

        let attempt = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            auth.login("john@example.com", "password123"),
        )
        .await;

        assert!(attempt.is_err());
        assert!(!auth.state().is_loading());
        assert_eq!(auth.user(), Some(&user));
        assert_eq!(store_with(&storage).user(), Some(&user));
    }

    #[tokio::test]
    async fn test_cancelled_signup_clears_loading() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut auth = AuthStore::load(
            Arc::clone(&storage),
            UserDirectory::demo(),
            LatencyConfig::default(),
        );

        let attempt = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            auth.signup(signup_form("ada@example.com")),
        )
        .await;

        assert!(attempt.is_err());
        assert!(!auth.state().is_loading());
        assert!(!auth.is_authenticated());
        assert!(!auth.directory().contains(&Email::parse("ada@example.com").unwrap()));
    }

    #[tokio::test]
    async fn test_failed_login_signs_out_current_user() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut auth = store_with(&storage);
        auth.login("demo@shophub.com", "demo123").await.unwrap();

        let err = auth.login("demo@shophub.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(
            err.to_string(),
            "Invalid email or password. Try demo@shophub.com / demo123"
        );
        assert!(!auth.is_authenticated());
        assert!(storage.get(keys::USER).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_signup_registers_and_signs_in() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut auth = store_with(&storage);

        let user = auth.signup(signup_form("ada@example.com")).await.unwrap();
        assert_eq!(user.id.as_str().len(), 9);
        assert_eq!(user.joined_date, Utc::now().date_naive());
        assert!(auth.is_authenticated());

        auth.logout();
        assert!(!auth.is_authenticated());
        assert!(storage.get(keys::USER).unwrap().is_none());

        // The new account stays in the directory for this run
        let again = auth.login("ADA@example.com", "hunter22").await.unwrap();
        assert_eq!(again.id, user.id);
    }

    #[tokio::test]
    async fn test_signup_with_existing_email_fails() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut auth = store_with(&storage);

        let err = auth
            .signup(signup_form("John@Example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
        assert_eq!(err.to_string(), "User with this email already exists");
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_signup_validation_reports_every_field() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut auth = store_with(&storage);

        let form = SignupForm {
            email: "not-an-email".to_string(),
            password: SecretString::from("123".to_string()),
            first_name: "  ".to_string(),
            last_name: String::new(),
            phone: None,
        };
        let Err(AuthError::Validation(errors)) = auth.signup(form).await else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 4);
        assert_eq!(
            errors.get(SignupField::Password),
            Some("Password must be at least 6 characters")
        );
        assert_eq!(auth.directory().len(), 2);
    }

    #[tokio::test]
    async fn test_update_profile_requires_user() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut auth = store_with(&storage);

        let err = auth
            .update_profile(ProfileUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No user logged in");
    }

    #[tokio::test]
    async fn test_update_profile_merges_and_persists() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut auth = store_with(&storage);
        auth.login("john@example.com", "password123").await.unwrap();

        let updated = auth
            .update_profile(ProfileUpdate {
                phone: Some("+1-555-9999".to_string()),
                ..ProfileUpdate::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.first_name, "John");
        assert_eq!(updated.phone.as_deref(), Some("+1-555-9999"));

        let restored = store_with(&storage);
        assert_eq!(
            restored.user().unwrap().phone.as_deref(),
            Some("+1-555-9999")
        );
    }
}
