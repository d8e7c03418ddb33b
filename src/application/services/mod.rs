//! Application services shared by the command handlers.

mod conversion_tracker;
mod email_dispatcher;
mod guest_provisioning;
mod setup_tokens;

pub use conversion_tracker::ConversionTracker;
pub use email_dispatcher::{DeliveryFailure, EmailDispatcher, RetryPolicy};
pub use guest_provisioning::{GuestProvisioningService, ProvisioningOutcome, ProvisioningSettings};
pub use setup_tokens::{SetupTokenError, SetupTokenManager};
