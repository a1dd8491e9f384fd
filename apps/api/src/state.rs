use crate::documents::service::DocumentService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Renders letters and runs the compliance review. Holds the reviewer
    /// built at startup rather than reaching for a global client.
    pub documents: DocumentService,
}
