pub mod context;
pub mod gate;

pub use context::AppContext;
pub use gate::{RouteGuard, SessionGate};
