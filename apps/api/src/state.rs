use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::assistant::AssistantClient;
use crate::config::Config;
use crate::draft::DraftStore;
use crate::session::BuilderSession;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Live builder sessions. One `CVDocument` per session, single writer per
    /// session by construction: every mutation runs under the write lock.
    pub sessions: Arc<RwLock<HashMap<Uuid, BuilderSession>>>,
    /// Local-first draft persistence with best-effort remote mirror.
    pub drafts: DraftStore,
    pub assistant: AssistantClient,
    pub config: Config,
}
