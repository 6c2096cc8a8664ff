//! Shared handler state.

use std::sync::Arc;

use jotter_core::{Authenticator, Store};

use crate::hub::{Hub, SessionSettings};
use crate::services::{AuthService, JwtAuthenticator, LabelService, NoteService};

#[derive(Clone)]
pub struct AppState {
    pub notes: NoteService,
    pub labels: LabelService,
    pub auth: AuthService,
    /// Resolves bearer tokens for HTTP routes and the WebSocket upgrade.
    pub authenticator: Arc<dyn Authenticator>,
    pub hub: Arc<Hub>,
    pub session: SessionSettings,
}

impl AppState {
    /// Wire services around one store and one hub.
    pub fn new(
        store: Arc<dyn Store>,
        tokens: Arc<JwtAuthenticator>,
        session: SessionSettings,
    ) -> Self {
        let hub = Arc::new(Hub::new());
        Self {
            notes: NoteService::new(Arc::clone(&store), Arc::clone(&hub)),
            labels: LabelService::new(Arc::clone(&store), Arc::clone(&hub)),
            auth: AuthService::new(store, Arc::clone(&tokens)),
            authenticator: tokens,
            hub,
            session,
        }
    }
}
