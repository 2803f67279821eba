//! REST seam for the clinic wizards.
//!
//! Maps submitted wizard forms onto the backend's request bodies, sends them
//! through a pluggable [`Transport`] with the signed-in user's bearer token,
//! and maps stored patients back into drafts for the edit wizard.
//!
//! Also hosts the ambient pieces an embedding app needs: layered
//! configuration ([`config`]), log setup ([`logging`]) and session storage
//! ([`session`]).

pub mod client;
pub mod config;
pub mod logging;
pub mod mock;
pub mod requests;
pub mod session;

pub use client::{
    error_message, ApiClient, ApiError, ApiRequest, ApiResponse, ApiResult, AppointmentClient,
    AppointmentSubmitter, Method, PatientClient, PatientSubmitter, Transport,
};
pub use config::{ApiConfig, AppEnvironment, LoggingConfig};
pub use logging::init_logging;
pub use mock::{transport_for, MockTransport};
pub use requests::*;
pub use session::{
    MemorySessionStore, Session, SessionError, SessionResult, SessionStore, SessionUser,
    SqliteSessionStore,
};
