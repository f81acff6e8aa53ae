//! Backend selection for the build target.
//!
//! [`NativeBackend`] is the windowing system the crate was built for:
//!
//!  - X11 with GLX on free unix systems (`x11` feature),
//!  - Win32 with WGL on Windows (`wgl` feature),
//!  - Cocoa with NSOpenGL on macOS.
//!
//! The [`headless`] backend is always available.

pub mod headless;

#[cfg(x11_platform)]
pub use crate::api::x11::{X11Backend, X11Surface};

#[cfg(win32_platform)]
pub use crate::api::wgl::{WglBackend, WglSurface};

#[cfg(cocoa_platform)]
pub use crate::api::cocoa::{CocoaBackend, CocoaSurface};

/// The native backend of the build target.
#[cfg(x11_platform)]
pub type NativeBackend = X11Backend;

/// The native backend of the build target.
#[cfg(win32_platform)]
pub type NativeBackend = WglBackend;

/// The native backend of the build target.
#[cfg(cocoa_platform)]
pub type NativeBackend = CocoaBackend;
