//! VR runtime adapters.
//!
//! The session talks to the compositor exclusively through the
//! [`OverlayRuntime`](crate::application::session::OverlayRuntime) seam
//! declared in the application layer.  A production build would implement it
//! over the compositor's C FFI; this crate ships the scripted
//! [`mock::MockRuntime`], which the binary's replay mode and the integration
//! tests drive.

pub mod mock;
