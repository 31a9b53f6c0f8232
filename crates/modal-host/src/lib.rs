//! Modal Host
//!
//! Bridges modal nodes of a declarative UI tree to a native modal
//! presentation mechanism:
//! - allocates one native surface per modal node and mounts its content
//! - drives each modal through `Created → Presenting → Presented →
//!   Dismissing → Destroyed`, one transition at a time
//! - lets the host replace the native present/dismiss transitions with its
//!   own [`InteractionHook`]s
//! - broadcasts [`ModalDismissed`] when a modal finishes dismissing
//! - tears everything down synchronously when the bridge is invalidated
//!
//! The primary type is [`ModalHostManager`], generic over a
//! [`NativePlatform`] adapter. [`HeadlessPlatform`] is an in-memory adapter
//! for tools and tests.
#![warn(missing_docs)]

mod completion;
mod config;
mod container;
mod error;
mod events;
mod headless;
mod hooks;
mod manager;
mod platform;
mod props;
mod state;

pub use completion::{Completion, TransitionKind};
pub use config::{DEFAULT_EVENT_CAPACITY, HostConfig};
pub use container::ModalHostContainer;
pub use error::{Error, Result};
pub use events::{DismissStream, Listener, ModalDismissed};
pub use headless::{HeadlessPlatform, HeadlessTop, NativeCall, SurfaceId};
pub use hooks::InteractionHook;
pub use manager::ModalHostManager;
pub use modal_ids::ModalId;
pub use platform::NativePlatform;
pub use props::{AnimationType, ModalProps, PresentationStyle};
pub use state::{Disposition, IgnoreReason, ModalHandle, ModalState};
