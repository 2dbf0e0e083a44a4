//! Remote composition domain module.
//!
//! - `model`: remote ids, the descriptor table and the role mapping
//! - `component`: what a remote exposes and what it receives
//! - `runtime`: the composition runtime and its failure hook

mod component;
mod model;
mod runtime;

pub use component::{RemoteComponent, RemoteModule, SharedStateHandle};
pub use model::{REMOTES, RemoteDescriptor, RemoteId, remote_for_role};
pub use runtime::{CompositionRuntime, LoadErrorArgs, RuntimePlugin};
