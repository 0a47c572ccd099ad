//! Application state shared across handlers

use std::sync::Arc;

use crate::{access::AccessMediator, middleware::JwtVerifier};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub mediator: Arc<AccessMediator>,
    pub jwt_verifier: JwtVerifier,
}
