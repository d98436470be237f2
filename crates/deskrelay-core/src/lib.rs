// Deskrelay core
// Decision: No HTTP types here; the gateway crate binds these to cookies and routes
//
// - throttle: per-session login attempt state machine
// - session: session model and store lifecycle (get-or-create, touch, update, destroy)
// - storage: session backends (in-memory, PostgreSQL)
// - credentials: static user directory and credential verification
// - password: Argon2id hashing

pub mod credentials;
pub mod password;
pub mod session;
pub mod storage;
pub mod throttle;

pub use credentials::{CredentialAttempt, UserDirectory, UserDirectoryError, UserRecord, VerifyOutcome};
pub use session::{Session, SessionConfig, SessionExpiry, SessionStore, SessionUser};
pub use storage::SessionBackend;
pub use throttle::{LoginThrottleState, ThrottleConfig, WindowResetPolicy};
