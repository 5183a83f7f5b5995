//! Infrastructure layer for the overlay host.
//!
//! Contains the OS- and runtime-facing adapters: the VR runtime seam
//! implementation, preference-file storage, and module process launching.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `overdeck_core`, but MUST NOT be imported by the `application` layer.

pub mod launch;
pub mod storage;
pub mod vr;
