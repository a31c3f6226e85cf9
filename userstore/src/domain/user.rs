//! User record and its validated field types.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::profile::ProfileDraft;
use super::role::Role;

/// Validation errors for user fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Username was empty or whitespace only.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Username fell below the minimum length.
    #[error("username must be at least {min} characters")]
    UsernameTooShort {
        /// Minimum accepted length.
        min: usize,
    },
    /// Username exceeded the maximum length.
    #[error("username must be at most {max} characters")]
    UsernameTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// Username contained characters outside the accepted set.
    #[error("username may only contain letters, numbers, dots, underscores, or dashes")]
    UsernameInvalidCharacters,
    /// Password was empty.
    #[error("password must not be empty")]
    EmptyPassword,
    /// Email did not look like an address.
    #[error("email is not a valid address: {value}")]
    InvalidEmail {
        /// The rejected input.
        value: String,
    },
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Minimum allowed length for a username.
pub const USERNAME_MIN: usize = 3;
/// Maximum allowed length for a username.
pub const USERNAME_MAX: usize = 32;

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        // Length is enforced separately; this regex constrains allowed characters.
        let pattern = "^[A-Za-z0-9._-]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

/// Unique account name for a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`] from owned input.
    pub fn new(username: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(username.into())
    }

    fn from_owned(username: String) -> Result<Self, UserValidationError> {
        if username.trim().is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }

        let length = username.chars().count();
        if length < USERNAME_MIN {
            return Err(UserValidationError::UsernameTooShort { min: USERNAME_MIN });
        }
        if length > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }

        if !username_regex().is_match(&username) {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }

        Ok(Self(username))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Email address validated for shape, not deliverability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`] from owned input.
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        let email = email.into();
        if !email_regex().is_match(&email) {
            return Err(UserValidationError::InvalidEmail { value: email });
        }
        Ok(Self(email))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

/// Stored user record.
///
/// ## Invariants
/// - `id` is unique and never changes after insert.
/// - `created_at` is set at insert; `updated_at` is refreshed by updates.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserId,
    username: Username,
    // Stored as provided; hashing happens upstream of this layer.
    password: String,
    email: Email,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Build a [`User`] from validated components.
    pub fn new(
        id: UserId,
        username: Username,
        password: impl Into<String>,
        email: Email,
        role: Role,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            password: password.into(),
            email,
            role,
            created_at,
            updated_at,
        }
    }

    /// Stable user identifier.
    pub const fn id(&self) -> &UserId {
        &self.id
    }

    /// Unique account name.
    pub const fn username(&self) -> &Username {
        &self.username
    }

    /// Stored password value.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Unique email address.
    pub const fn email(&self) -> &Email {
        &self.email
    }

    /// Subscription role.
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Insert timestamp.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last-modification timestamp.
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Project every stored column into a map keyed by column name.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("id".to_owned(), Value::String(self.id.to_string()));
        map.insert(
            "username".to_owned(),
            Value::String(self.username.as_ref().to_owned()),
        );
        map.insert("password".to_owned(), Value::String(self.password.clone()));
        map.insert(
            "email".to_owned(),
            Value::String(self.email.as_ref().to_owned()),
        );
        map.insert("role".to_owned(), Value::String(self.role.to_string()));
        map.insert(
            "created_at".to_owned(),
            Value::String(self.created_at.to_rfc3339()),
        );
        map.insert(
            "updated_at".to_owned(),
            Value::String(self.updated_at.to_rfc3339()),
        );
        map
    }
}

/// Validated draft for inserting a new user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique account name.
    pub username: Username,
    /// Password value, stored as provided.
    pub password: String,
    /// Unique email address.
    pub email: Email,
    /// Subscription role.
    pub role: Role,
}

impl NewUser {
    /// Build a draft with the default [`Role::Demo`].
    pub fn new(username: Username, password: impl Into<String>, email: Email) -> Self {
        Self {
            username,
            password: password.into(),
            email,
            role: Role::default(),
        }
    }

    /// Override the subscription role.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Deserialisable user payload accepted at the API boundary.
///
/// Requires username, password, and email; role defaults to demo and the
/// nested profile payload defaults to an empty draft.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserDraft {
    /// Requested account name.
    pub username: String,
    /// Password value.
    pub password: String,
    /// Email address.
    pub email: String,
    /// Subscription role; demo when omitted.
    #[serde(default)]
    pub role: Role,
    /// Nested profile payload; empty when omitted.
    #[serde(default)]
    pub profile: ProfileDraft,
}

impl UserDraft {
    /// Validate into a users-table draft plus the nested profile payload.
    pub fn into_parts(self) -> Result<(NewUser, ProfileDraft), UserValidationError> {
        if self.password.is_empty() {
            return Err(UserValidationError::EmptyPassword);
        }
        let username = Username::new(self.username)?;
        let email = Email::new(self.email)?;

        Ok((
            NewUser {
                username,
                password: self.password,
                email,
                role: self.role,
            },
            self.profile,
        ))
    }
}

#[cfg(test)]
mod tests {
    //! Validation coverage for user field types and the draft schema.
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case("ann.smith")]
    #[case("a_b-c")]
    #[case("abc")]
    fn valid_usernames_are_accepted(#[case] value: &str) {
        let username = Username::new(value).expect("valid username");
        assert_eq!(username.as_ref(), value);
    }

    #[rstest]
    #[case("", UserValidationError::EmptyUsername)]
    #[case("   ", UserValidationError::EmptyUsername)]
    #[case("ab", UserValidationError::UsernameTooShort { min: USERNAME_MIN })]
    #[case("has space", UserValidationError::UsernameInvalidCharacters)]
    fn invalid_usernames_are_rejected(#[case] value: &str, #[case] expected: UserValidationError) {
        assert_eq!(Username::new(value), Err(expected));
    }

    #[rstest]
    fn overlong_username_is_rejected() {
        let value = "a".repeat(USERNAME_MAX + 1);
        assert_eq!(
            Username::new(value),
            Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX })
        );
    }

    #[rstest]
    #[case("a@b.com")]
    #[case("first.last@sub.example.org")]
    fn valid_emails_are_accepted(#[case] value: &str) {
        let email = Email::new(value).expect("valid email");
        assert_eq!(email.as_ref(), value);
    }

    #[rstest]
    #[case("")]
    #[case("plainaddress")]
    #[case("a@b")]
    #[case("a b@c.com")]
    #[case("two@@c.com")]
    fn invalid_emails_are_rejected(#[case] value: &str) {
        assert!(matches!(
            Email::new(value),
            Err(UserValidationError::InvalidEmail { .. })
        ));
    }

    #[rstest]
    fn draft_defaults_role_to_demo_and_profile_to_empty() {
        let draft: UserDraft = serde_json::from_value(json!({
            "username": "ann",
            "password": "x",
            "email": "a@b.com",
        }))
        .expect("deserialise draft");

        let (user, profile) = draft.into_parts().expect("valid draft");
        assert_eq!(user.role, Role::Demo);
        assert_eq!(user.username.as_ref(), "ann");
        assert_eq!(profile, ProfileDraft::default());
    }

    #[rstest]
    fn draft_normalises_nested_profile_payload() {
        let draft: UserDraft = serde_json::from_value(json!({
            "username": "ann",
            "password": "x",
            "email": "a@b.com",
            "role": "pro",
            "profile": { "phone": "+123", "name": "Ann" },
        }))
        .expect("deserialise draft");

        let (user, profile) = draft.into_parts().expect("valid draft");
        assert_eq!(user.role, Role::Pro);
        assert_eq!(profile.phone.as_deref(), Some("+123"));
        assert_eq!(profile.name.as_deref(), Some("Ann"));
        assert!(profile.surname.is_none());
    }

    #[rstest]
    fn draft_rejects_empty_password() {
        let draft: UserDraft = serde_json::from_value(json!({
            "username": "ann",
            "password": "",
            "email": "a@b.com",
        }))
        .expect("deserialise draft");

        assert_eq!(
            draft.into_parts().map(|_| ()),
            Err(UserValidationError::EmptyPassword)
        );
    }

    #[rstest]
    fn draft_rejects_unknown_payload_fields() {
        let result = serde_json::from_value::<UserDraft>(json!({
            "username": "ann",
            "password": "x",
            "email": "a@b.com",
            "is_admin": true,
        }));
        assert!(result.is_err());
    }

    #[rstest]
    fn to_map_projects_every_column() {
        let now = Utc::now();
        let user = User::new(
            UserId::random(),
            Username::new("ann").expect("username"),
            "secret",
            Email::new("a@b.com").expect("email"),
            Role::Basic,
            now,
            now,
        );

        let map = user.to_map();
        for key in [
            "id",
            "username",
            "password",
            "email",
            "role",
            "created_at",
            "updated_at",
        ] {
            assert!(map.contains_key(key), "missing column {key}");
        }
        assert_eq!(map.len(), 7);
        assert_eq!(map["role"], json!("basic"));
        assert_eq!(map["username"], json!("ann"));
    }

    #[rstest]
    fn random_ids_are_unique_and_non_empty() {
        let first = UserId::random();
        let second = UserId::random();
        assert_ne!(first, second);
        assert!(!first.to_string().is_empty());
    }
}
