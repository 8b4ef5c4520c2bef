//! In-memory demo user directory.

use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};

use shophub_core::{Email, UserId};

use crate::models::user::User;

/// A directory entry: the user plus their demo password.
#[derive(Debug, Clone)]
pub struct DemoAccount {
    pub user: User,
    password: SecretString,
}

impl DemoAccount {
    #[must_use]
    pub const fn new(user: User, password: SecretString) -> Self {
        Self { user, password }
    }

    fn password_matches(&self, candidate: &str) -> bool {
        self.password.expose_secret() == candidate
    }
}

/// Users that can sign in.
///
/// Lives only in memory: accounts registered during a run are gone on the
/// next one. Passwords are compared in plain text.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    accounts: Vec<DemoAccount>,
}

impl UserDirectory {
    /// An empty directory.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            accounts: Vec::new(),
        }
    }

    /// The two seeded demo accounts.
    #[must_use]
    pub fn demo() -> Self {
        let seed = [
            (
                "1",
                "demo@shophub.com",
                "demo123",
                ("Demo", "User"),
                "+1-555-0123",
                (2024, 1, 15),
            ),
            (
                "2",
                "john@example.com",
                "password123",
                ("John", "Doe"),
                "+1-555-0456",
                (2024, 2, 20),
            ),
        ];

        let accounts = seed
            .into_iter()
            .filter_map(|(id, email, password, (first, last), phone, (y, m, d))| {
                let user = User {
                    id: UserId::new(id),
                    email: Email::parse(email).ok()?,
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    phone: Some(phone.to_string()),
                    avatar: None,
                    joined_date: NaiveDate::from_ymd_opt(y, m, d)?,
                };
                Some(DemoAccount::new(user, SecretString::from(password.to_string())))
            })
            .collect();

        Self { accounts }
    }

    /// Find the user whose email (case-insensitive) and password match.
    #[must_use]
    pub fn authenticate(&self, email: &str, password: &str) -> Option<&User> {
        self.accounts
            .iter()
            .find(|a| a.user.email.matches(email) && a.password_matches(password))
            .map(|a| &a.user)
    }

    /// Whether an account with this email exists.
    #[must_use]
    pub fn contains(&self, email: &Email) -> bool {
        self.accounts
            .iter()
            .any(|a| a.user.email.matches(email.as_str()))
    }

    /// Add an account. Callers check [`Self::contains`] first.
    pub fn register(&mut self, user: User, password: SecretString) {
        self.accounts.push(DemoAccount::new(user, password));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
