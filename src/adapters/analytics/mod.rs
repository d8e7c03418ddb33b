//! Analytics provider adapters.
//!
//! - `MetaConversionsProvider` - Meta Conversions API
//! - `NoopAnalyticsProvider` - tracking disabled
//! - `MockAnalyticsProvider` - records events for tests

mod meta;
mod mock;

pub use meta::MetaConversionsProvider;
pub use mock::{MockAnalyticsProvider, NoopAnalyticsProvider};
