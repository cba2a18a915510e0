//! Admin surface: authorization guard and the order status manager.
mod guard;
mod status_manager;

pub use guard::{AdminGuard, AdminSession};
pub use status_manager::{OrderStatusManager, StatusCounts};
