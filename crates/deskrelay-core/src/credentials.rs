// Static user directory and credential verification
// Decision: Users are loaded once from a YAML file and shared read-only afterwards
// Decision: Unknown usernames are checked against a dummy hash so both failure paths cost the same

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::Deserialize;
use thiserror::Error;

use crate::password::{self, PasswordError};
use crate::session::SessionUser;

/// One configured agent
#[derive(Clone, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("username", &self.username)
            .field("display_name", &self.display_name)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct UsersFile {
    #[serde(default)]
    users: Vec<UserRecord>,
}

/// Username and plaintext password for a single verification call.
/// Never stored; the password is redacted from `Debug` output.
pub struct CredentialAttempt<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl fmt::Debug for CredentialAttempt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialAttempt")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Result of a credential check. Unknown user and wrong password are the same `NoMatch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Match(SessionUser),
    NoMatch,
}

#[derive(Debug, Error)]
pub enum UserDirectoryError {
    #[error("failed to read users file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse users file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("duplicate username '{0}'")]
    DuplicateUsername(String),

    #[error("user '{username}' has an invalid password hash: {source}")]
    InvalidHash {
        username: String,
        #[source]
        source: PasswordError,
    },

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Immutable set of users allowed to log in
pub struct UserDirectory {
    users: HashMap<String, UserRecord>,
    dummy_hash: String,
}

impl UserDirectory {
    pub fn new(records: Vec<UserRecord>) -> Result<Self, UserDirectoryError> {
        let mut users = HashMap::with_capacity(records.len());
        for record in records {
            password::validate_hash(&record.password_hash).map_err(|source| {
                UserDirectoryError::InvalidHash {
                    username: record.username.clone(),
                    source,
                }
            })?;
            if users.contains_key(&record.username) {
                return Err(UserDirectoryError::DuplicateUsername(record.username));
            }
            users.insert(record.username.clone(), record);
        }

        let filler: [u8; 16] = rand::thread_rng().gen();
        let dummy_hash = password::hash_password(&hex::encode(filler))?;

        Ok(Self { users, dummy_hash })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, UserDirectoryError> {
        let file: UsersFile = serde_yaml::from_str(yaml)?;
        Self::new(file.users)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, UserDirectoryError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| UserDirectoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Check credentials. Slow by construction (Argon2); call from a blocking context.
    pub fn verify(&self, attempt: &CredentialAttempt<'_>) -> VerifyOutcome {
        let (hash, record) = match self.users.get(attempt.username) {
            Some(record) => (record.password_hash.as_str(), Some(record)),
            None => (self.dummy_hash.as_str(), None),
        };

        let valid = password::verify_password(attempt.password, hash).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Password verification failed");
            false
        });

        match record {
            Some(record) if valid => VerifyOutcome::Match(SessionUser {
                username: record.username.clone(),
                display_name: record.display_name.clone(),
            }),
            _ => VerifyOutcome::NoMatch,
        }
    }
}

impl fmt::Debug for UserDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut usernames: Vec<_> = self.users.keys().collect();
        usernames.sort();
        f.debug_struct("UserDirectory")
            .field("users", &usernames)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn record(username: &str, display_name: &str, password: &str) -> UserRecord {
        UserRecord {
            username: username.to_string(),
            display_name: display_name.to_string(),
            password_hash: password::hash_password(password).unwrap(),
        }
    }

    fn directory() -> UserDirectory {
        UserDirectory::new(vec![
            record("alice", "Alice", "wonderland"),
            record("bob", "Bob", "builder"),
        ])
        .unwrap()
    }

    #[test]
    fn test_verify_match() {
        let users = directory();
        let outcome = users.verify(&CredentialAttempt {
            username: "alice",
            password: "wonderland",
        });

        assert_eq!(
            outcome,
            VerifyOutcome::Match(SessionUser {
                username: "alice".to_string(),
                display_name: "Alice".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_user_and_wrong_password_are_indistinguishable() {
        let users = directory();

        let wrong_password = users.verify(&CredentialAttempt {
            username: "bob",
            password: "wrong",
        });
        let unknown_user = users.verify(&CredentialAttempt {
            username: "mallory",
            password: "wrong",
        });

        assert_eq!(wrong_password, VerifyOutcome::NoMatch);
        assert_eq!(unknown_user, VerifyOutcome::NoMatch);
        assert_eq!(wrong_password, unknown_user);
    }

    #[test]
    fn test_username_is_exact_match() {
        let users = directory();
        let outcome = users.verify(&CredentialAttempt {
            username: "Alice",
            password: "wonderland",
        });
        assert_eq!(outcome, VerifyOutcome::NoMatch);
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let result = UserDirectory::new(vec![
            record("alice", "Alice", "a"),
            record("alice", "Alice Again", "b"),
        ]);
        assert!(matches!(
            result,
            Err(UserDirectoryError::DuplicateUsername(name)) if name == "alice"
        ));
    }

    #[test]
    fn test_invalid_hash_rejected() {
        let result = UserDirectory::new(vec![UserRecord {
            username: "carol".to_string(),
            display_name: "Carol".to_string(),
            password_hash: "hunter2".to_string(),
        }]);
        assert!(matches!(
            result,
            Err(UserDirectoryError::InvalidHash { username, .. }) if username == "carol"
        ));
    }

    #[test]
    fn test_load_from_yaml_file() {
        let hash = password::hash_password("secret").unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "users:\n  - username: dana\n    display_name: Dana Scully\n    password_hash: \"{}\"",
            hash
        )
        .unwrap();

        let users = UserDirectory::load(file.path()).unwrap();
        assert_eq!(users.len(), 1);
        assert!(matches!(
            users.verify(&CredentialAttempt {
                username: "dana",
                password: "secret",
            }),
            VerifyOutcome::Match(user) if user.display_name == "Dana Scully"
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = UserDirectory::load("/nonexistent/users.yaml");
        assert!(matches!(result, Err(UserDirectoryError::Io { .. })));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let attempt = CredentialAttempt {
            username: "alice",
            password: "wonderland",
        };
        let printed = format!("{:?}", attempt);
        assert!(printed.contains("alice"));
        assert!(!printed.contains("wonderland"));

        let rec = record("alice", "Alice", "wonderland");
        assert!(!format!("{:?}", rec).contains("$argon2"));
    }
}
