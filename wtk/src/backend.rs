//! The seam between the toolkit and a native windowing system.

use std::ffi::{c_void, CStr};

use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

use crate::error::Result;
use crate::event::NativeEvent;
use crate::window::{WindowAttributes, WindowId};

/// A native windowing system able to host windows with an OpenGL context.
///
/// The toolkit calls [`Backend::init`] before the first window is created
/// and [`Backend::quit`] once the last one is gone, so an implementation only
/// holds process-wide native resources between those two calls.
pub trait Backend {
    /// The native window, its drawable and its context.
    ///
    /// Dropping it must release every native resource it owns.
    type Surface;

    /// Acquire the process-wide resources, e.g. the display connection or
    /// the context creation entry points.
    fn init(&mut self) -> Result<()>;

    /// Release everything acquired by [`Backend::init`].
    fn quit(&mut self);

    /// Create a native window with its drawable and context.
    ///
    /// Events for this window must be reported with `id`.
    fn create_window(&mut self, id: WindowId, attributes: &WindowAttributes)
        -> Result<Self::Surface>;

    /// Destroy a window. No events are reported for it afterwards.
    fn destroy_window(&mut self, surface: Self::Surface);

    /// Drain every pending native event without blocking, passing each
    /// recognized one to `sink` in arrival order.
    fn poll_events(&mut self, sink: &mut dyn FnMut(WindowId, NativeEvent));

    /// Make the context of the window current on the calling thread.
    fn make_current(&mut self, surface: &Self::Surface) -> Result<()>;

    /// Present the back buffer of the window.
    fn swap_buffers(&mut self, surface: &Self::Surface) -> Result<()>;

    /// Move the window on the screen.
    fn set_origin(&mut self, surface: &Self::Surface, x: i32, y: i32);

    /// Resize the drawable area of the window.
    fn set_size(&mut self, surface: &Self::Surface, width: i32, height: i32);

    /// Change the title of the window.
    fn set_title(&mut self, surface: &Self::Surface, title: &str);

    /// The address of an OpenGL function, or null when it's not available.
    fn get_proc_address(&self, name: &CStr) -> *const c_void;

    /// The raw handle of the native window.
    fn raw_window_handle(&self, _surface: &Self::Surface) -> Option<RawWindowHandle> {
        None
    }

    /// The raw handle of the native display.
    fn raw_display_handle(&self) -> Option<RawDisplayHandle> {
        None
    }
}
