//! The user's profile, persisted in the store's settings table.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::storage::ReportStore;

const FIRST_NAME_KEY: &str = "profile.first_name";
const LAST_NAME_KEY: &str = "profile.last_name";
const USERNAME_KEY: &str = "profile.username";
const EMAIL_KEY: &str = "profile.email";

const PROFILE_KEYS: [&str; 4] = [FIRST_NAME_KEY, LAST_NAME_KEY, USERNAME_KEY, EMAIL_KEY];

/// Editable fields shown on the profile screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Handle shown next to reports.
    pub username: String,
    /// Contact address.
    pub email: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            username: "johndoe".to_string(),
            email: "johndoe@example.com".to_string(),
        }
    }
}

/// Which profile field to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    /// [`Profile::first_name`]
    FirstName,
    /// [`Profile::last_name`]
    LastName,
    /// [`Profile::username`]
    Username,
    /// [`Profile::email`]
    Email,
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid email pattern")
    })
}

impl Profile {
    /// Load the stored profile, filling missing fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be read.
    pub fn load(store: &ReportStore) -> Result<Self> {
        let defaults = Self::default();
        let read = |key: &str, fallback: String| -> Result<String> {
            Ok(store.get_setting(key)?.unwrap_or(fallback))
        };

        Ok(Self {
            first_name: read(FIRST_NAME_KEY, defaults.first_name)?,
            last_name: read(LAST_NAME_KEY, defaults.last_name)?,
            username: read(USERNAME_KEY, defaults.username)?,
            email: read(EMAIL_KEY, defaults.email)?,
        })
    }

    /// Validate and persist every field.
    ///
    /// All fields are written in one transaction, so a failed save leaves the
    /// stored profile as it was.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the settings cannot be written.
    pub fn save(&self, store: &ReportStore) -> Result<()> {
        self.validate()?;

        store.set_settings(&[
            (FIRST_NAME_KEY, self.first_name.as_str()),
            (LAST_NAME_KEY, self.last_name.as_str()),
            (USERNAME_KEY, self.username.as_str()),
            (EMAIL_KEY, self.email.as_str()),
        ])?;

        debug!(username = %self.username, "Saved profile");
        Ok(())
    }

    /// Forget the stored profile ("log out") and return the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be removed.
    pub fn reset(store: &ReportStore) -> Result<Self> {
        for key in PROFILE_KEYS {
            store.remove_setting(key)?;
        }
        info!("Profile reset to defaults");
        Ok(Self::default())
    }

    /// Check the fields that have a required shape.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProfile`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(Error::invalid_profile("username", "must not be empty"));
        }
        if self.username.chars().any(char::is_whitespace) {
            return Err(Error::invalid_profile(
                "username",
                "must not contain whitespace",
            ));
        }
        if !email_pattern().is_match(self.email.trim()) {
            return Err(Error::invalid_profile(
                "email",
                format!("'{}' is not an email address", self.email),
            ));
        }
        Ok(())
    }

    /// Replace one field.
    pub fn set(&mut self, field: ProfileField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ProfileField::FirstName => self.first_name = value,
            ProfileField::LastName => self.last_name = value,
            ProfileField::Username => self.username = value,
            ProfileField::Email => self.email = value,
        }
    }

    /// First and last name joined for display.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ReportStore {
        ReportStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_default_profile() {
        let profile = Profile::default();
        assert_eq!(profile.first_name, "John");
        assert_eq!(profile.last_name, "Doe");
        assert_eq!(profile.username, "johndoe");
        assert_eq!(profile.email, "johndoe@example.com");
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_load_empty_store_gives_defaults() {
        assert_eq!(Profile::load(&store()).unwrap(), Profile::default());
    }

    #[test]
    fn test_save_and_load() {
        let store = store();
        let mut profile = Profile::default();
        profile.set(ProfileField::FirstName, "Ada");
        profile.set(ProfileField::Email, "ada@csuf.edu");
        profile.save(&store).unwrap();

        let loaded = Profile::load(&store).unwrap();
        assert_eq!(loaded.first_name, "Ada");
        assert_eq!(loaded.email, "ada@csuf.edu");
        assert_eq!(loaded.last_name, "Doe");
    }

    #[test]
    fn test_reset_restores_defaults() {
        let store = store();
        let mut profile = Profile::default();
        profile.set(ProfileField::Username, "patrol42");
        profile.save(&store).unwrap();

        let reset = Profile::reset(&store).unwrap();
        assert_eq!(reset, Profile::default());
        assert_eq!(Profile::load(&store).unwrap(), Profile::default());
    }

    #[test]
    fn test_save_rejects_invalid_and_keeps_previous() {
        let store = store();
        let mut profile = Profile::default();
        profile.set(ProfileField::Email, "not-an-email");

        let err = profile.save(&store).unwrap_err();
        assert!(matches!(err, Error::InvalidProfile { field: "email", .. }));
        assert_eq!(Profile::load(&store).unwrap().email, "johndoe@example.com");
    }

    #[test]
    fn test_failed_write_keeps_whole_profile() {
        let db_path =
            std::env::temp_dir().join(format!("parkpatrol_profile_{}.db", std::process::id()));
        let _ = std::fs::remove_file(&db_path);

        let store = ReportStore::open(&db_path).unwrap();
        {
            let other = rusqlite::Connection::open(&db_path).unwrap();
            other
                .execute_batch(
                    "CREATE TRIGGER reject_email BEFORE INSERT ON settings
                     WHEN NEW.key = 'profile.email'
                     BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
                )
                .unwrap();
        }

        let mut profile = Profile::default();
        profile.set(ProfileField::FirstName, "Ada");
        profile.set(ProfileField::Email, "ada@csuf.edu");

        let err = profile.save(&store).unwrap_err();
        assert!(err.is_storage_error());
        assert_eq!(Profile::load(&store).unwrap(), Profile::default());

        drop(store);
        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_file(db_path.with_extension("db-wal"));
        let _ = std::fs::remove_file(db_path.with_extension("db-shm"));
    }

    #[test]
    fn test_validate_username() {
        let mut profile = Profile::default();
        profile.set(ProfileField::Username, "  ");
        assert!(matches!(
            profile.validate(),
            Err(Error::InvalidProfile {
                field: "username",
                ..
            })
        ));

        profile.set(ProfileField::Username, "john doe");
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_validate_email_shapes() {
        let mut profile = Profile::default();
        for good in ["a@b.co", "first.last@csu.fullerton.edu"] {
            profile.set(ProfileField::Email, good);
            assert!(profile.validate().is_ok(), "{good} should be accepted");
        }
        for bad in ["", "plain", "a@b", "a b@c.d", "@c.d"] {
            profile.set(ProfileField::Email, bad);
            assert!(profile.validate().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_full_name() {
        assert_eq!(Profile::default().full_name(), "John Doe");

        let mut profile = Profile::default();
        profile.set(ProfileField::LastName, "");
        assert_eq!(profile.full_name(), "John");
    }
}
