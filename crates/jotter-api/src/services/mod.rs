//! Mutation pipeline and account services.
//!
//! Services own the sequencing rules: validate, check ownership, write, read
//! back, and only then notify the hub. Handlers stay thin.

pub mod auth_service;
pub mod label_service;
pub mod note_service;

pub use auth_service::{AuthResponse, AuthService, JwtAuthenticator, LoginRequest, RegisterRequest};
pub use label_service::LabelService;
pub use note_service::{AdvancedSearch, NoteService};
