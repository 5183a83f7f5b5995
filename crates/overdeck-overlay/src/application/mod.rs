//! Application layer use cases for the overlay host.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (here: the pure `overdeck-core` engine) and the infrastructure
//! (VR runtime bindings, preference files, process launching).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** the engine and the module deck to fulfil a user goal
//!   (e.g., "make the panel interactive while a controller points at it").
//! - **Depend on abstractions** (traits declared next to their consumer),
//!   so the infrastructure can be swapped without changing this code.
//! - **Talk to the VR runtime only through the [`session::OverlayRuntime`]
//!   seam**, never through FFI directly.
//!
//! # Sub-modules
//!
//! - **`session`** – Owns the overlay handle and the input bridge, and runs
//!   the per-frame tick: availability guards, the hover interactivity gate,
//!   and the pump.  This is the most critical use case: it runs on every
//!   rendered frame.
//!
//! - **`modules`** – The module deck: discovery and validation of launchable
//!   user modules, the loaded-module registry, and the repeat-launch
//!   scheduler.

pub mod modules;
pub mod session;
