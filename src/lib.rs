//! Jobly session core.
//!
//! SYSTEM CONTEXT
//! ==============
//! The backend signs a token naming the user; the client stores it, decodes
//! it to find the username, and fetches the user record from the REST API.
//! [`token`] is the backend half, [`session`] the client half, and [`api`]
//! plus [`storage`] are the seams the session is built on.

pub mod api;
pub mod config;
pub mod models;
pub mod session;
pub mod storage;
pub mod token;

pub use api::{ApiError, HttpJoblyApi, JoblyApi};
pub use config::{ClientConfig, IssuerConfig};
pub use models::{JobId, LoginData, SignupData, User};
pub use session::{ApplyOutcome, AuthErrors, LoadState, Resolution, Session, SessionError};
pub use storage::{FileTokenStore, MemoryTokenStore, StorageError, TOKEN_STORAGE_ID, TokenStore};
pub use token::{Claims, TokenError, TokenIssuer, TokenSubject};
