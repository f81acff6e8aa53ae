//! The native windowing backends.

#[cfg(cocoa_platform)]
pub mod cocoa;
#[cfg(win32_platform)]
pub mod wgl;
#[cfg(x11_platform)]
pub mod x11;
