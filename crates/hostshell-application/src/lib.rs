//! Application layer for the host shell.
//!
//! Owns the shared state store and everything that composes a remote into
//! the host: resolution, the remote slot, rendering-error containment and
//! the session-gated gateway.

pub mod boundary;
pub mod facet;
pub mod gateway;
pub mod resolver;
pub mod slot;
pub mod store;

pub use facet::StoreFacet;
pub use gateway::{CompositionGateway, DashboardView, GatewayState, HeaderView, SlotView, Surface};
pub use resolver::{LoadingPlaceholder, RemoteResolver, Resolution};
pub use slot::{RemoteSlot, SlotState};
pub use store::{SharedStateStore, StoreState};
