//! Order domain module.
//!
//! - `aggregate` - Order entity and its terminal write
//! - `status` - OrderStatus state machine
//! - `plan` - purchasable plans

mod aggregate;
mod plan;
mod status;

pub use aggregate::{Order, OrderCompletion};
pub use plan::{PlanType, ANNUAL_PLAN_DAYS};
pub use status::OrderStatus;
