//! Payment handlers.
//!
//! ## Commands
//! - Initiating a checkout with the gateway
//! - Processing the gateway's encrypted callback

mod handle_payment_callback;
mod initiate_checkout;

pub use handle_payment_callback::{
    CallbackOutcome, HandlePaymentCallbackCommand, HandlePaymentCallbackHandler,
    HandlePaymentCallbackResult,
};
pub use initiate_checkout::{
    CheckoutError, CheckoutSettings, InitiateCheckoutCommand, InitiateCheckoutHandler,
    InitiateCheckoutResult,
};
