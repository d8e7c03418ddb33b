//! Shared application state handed to every axum handler.

use std::sync::Arc;

use crate::application::handlers::account::{
    CompleteAccountSetupHandler, VerifySetupTokenHandler,
};
use crate::application::handlers::payment::{
    HandlePaymentCallbackHandler, InitiateCheckoutHandler,
};

/// Shared application state containing all request handlers.
///
/// Cloned per request; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub callback_handler: Arc<HandlePaymentCallbackHandler>,
    pub checkout_handler: Arc<InitiateCheckoutHandler>,
    pub verify_token_handler: Arc<VerifySetupTokenHandler>,
    pub account_setup_handler: Arc<CompleteAccountSetupHandler>,
    /// Base URL that completion redirects are rendered under.
    pub frontend_url: Arc<str>,
}
