//! The public facade owning the backend and every window.

use std::ffi::{c_void, CString};
use std::fmt;

use log::{debug, trace};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use slotmap::SlotMap;

use crate::backend::Backend;
use crate::error::Result;
use crate::event::{self, MotionTracker, NativeEvent};
use crate::window::{EventCallback, Rect, WindowAttributes, WindowId, WindowState};

/// Bookkeeping deciding when the backend is bootstrapped and torn down.
///
/// The backend is bootstrapped exactly while a window is alive or
/// [`Wtk::init`] pinned it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GlobalContext {
    live_windows: usize,
    pinned: bool,
    bootstrapped: bool,
}

impl GlobalContext {
    /// Number of windows created and not yet deleted.
    pub fn live_windows(&self) -> usize {
        self.live_windows
    }

    /// Whether the backend holds its process-wide resources.
    pub fn is_bootstrapped(&self) -> bool {
        self.bootstrapped
    }

    fn acquire<B: Backend>(&mut self, backend: &mut B) -> Result<()> {
        if !self.bootstrapped {
            debug!("bootstrapping the native backend");
            backend.init()?;
            self.bootstrapped = true;
        }

        Ok(())
    }

    fn release<B: Backend>(&mut self, backend: &mut B) {
        if self.bootstrapped && self.live_windows == 0 && !self.pinned {
            debug!("tearing the native backend down");
            backend.quit();
            self.bootstrapped = false;
        }
    }
}

struct Window<S> {
    surface: S,
    state: WindowState,
    callback: Option<EventCallback>,
    tracker: MotionTracker,
}

impl<S> Window<S> {
    fn dispatch(&mut self, native: NativeEvent) {
        let Some(event) = event::translate(&mut self.state, &mut self.tracker, native) else {
            return;
        };

        if let Some(callback) = self.callback.as_mut() {
            callback(&mut self.state, &event);
        }
    }
}

/// A set of windows hosted by a native windowing backend.
///
/// # Example
///
/// Applications usually pick [`NativeBackend`](crate::platform), which only
/// exists when the build target has a windowing feature enabled.
///
/// ```no_run
/// use wtk::event::Event;
/// use wtk::{Backend, WindowAttributes, Wtk};
///
/// fn run<B: Backend>(backend: B) -> wtk::error::Result<()> {
///     let mut wtk = Wtk::new(backend);
///     let attrs = WindowAttributes::new().with_title("wtk").with_callback(|_, event| {
///         if let Event::KeyDown { keycode, .. } = event {
///             println!("{keycode:?}");
///         }
///     });
///     let window = wtk.create_window(attrs)?;
///
///     while !wtk.window_should_close(window) {
///         wtk.make_current(window)?;
///         wtk.swap_buffers(window)?;
///         wtk.poll_events();
///     }
///
///     wtk.delete_window(window);
///     Ok(())
/// }
/// ```
pub struct Wtk<B: Backend> {
    backend: B,
    context: GlobalContext,
    windows: SlotMap<WindowId, Window<B::Surface>>,
}

impl<B: Backend> Wtk<B> {
    /// Wrap `backend`. Nothing native happens until the first window is
    /// created or [`Wtk::init`] is called.
    pub fn new(backend: B) -> Self {
        Self { backend, context: GlobalContext::default(), windows: SlotMap::with_key() }
    }

    /// Bootstrap the backend and keep it alive until [`Wtk::quit`], even
    /// when no window exists.
    pub fn init(&mut self) -> Result<()> {
        self.context.acquire(&mut self.backend)?;
        self.context.pinned = true;
        Ok(())
    }

    /// Drop the pin taken by [`Wtk::init`]. The backend is torn down right
    /// away unless windows are still alive.
    pub fn quit(&mut self) {
        self.context.pinned = false;
        self.context.release(&mut self.backend);
    }

    /// Whether the backend holds its process-wide resources.
    pub fn is_bootstrapped(&self) -> bool {
        self.context.is_bootstrapped()
    }

    /// Number of windows created and not yet deleted.
    pub fn live_windows(&self) -> usize {
        self.context.live_windows()
    }

    /// The lifecycle bookkeeping.
    pub fn global_context(&self) -> &GlobalContext {
        &self.context
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend, mutably.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Create a window, bootstrapping the backend first if needed.
    ///
    /// On failure nothing is left behind: a backend bootstrapped for this
    /// call alone is torn down again.
    pub fn create_window(&mut self, mut attributes: WindowAttributes) -> Result<WindowId> {
        self.context.acquire(&mut self.backend)?;

        let callback = attributes.callback.take();
        let state = WindowState::new(attributes.title.clone(), attributes.rect());
        let backend = &mut self.backend;
        let created = self.windows.try_insert_with_key(|id| {
            backend.create_window(id, &attributes).map(|surface| Window {
                surface,
                state,
                callback,
                tracker: MotionTracker::default(),
            })
        });

        match created {
            Ok(id) => {
                self.context.live_windows += 1;
                debug!("created window {id:?}, {} live", self.context.live_windows);
                Ok(id)
            },
            Err(err) => {
                debug!("failed to create a window: {err}");
                self.context.release(&mut self.backend);
                Err(err)
            },
        }
    }

    /// Destroy a window. The backend is torn down with the last window
    /// unless it's pinned. Stale ids are ignored.
    pub fn delete_window(&mut self, id: WindowId) {
        let Some(window) = self.windows.remove(id) else {
            return;
        };

        self.backend.destroy_window(window.surface);
        self.context.live_windows -= 1;
        debug!("deleted window {id:?}, {} live", self.context.live_windows);
        self.context.release(&mut self.backend);
    }

    /// Dispatch every pending event to the callback of its window, without
    /// blocking.
    pub fn poll_events(&mut self) {
        if !self.context.bootstrapped {
            return;
        }

        let windows = &mut self.windows;
        self.backend.poll_events(&mut |id, native| match windows.get_mut(id) {
            Some(window) => window.dispatch(native),
            None => trace!("discarding {native:?} for unknown window {id:?}"),
        });
    }

    /// Make the context of the window current on this thread.
    pub fn make_current(&mut self, id: WindowId) -> Result<()> {
        match self.windows.get(id) {
            Some(window) => self.backend.make_current(&window.surface),
            None => Ok(()),
        }
    }

    /// Present the back buffer of the window.
    pub fn swap_buffers(&mut self, id: WindowId) -> Result<()> {
        match self.windows.get(id) {
            Some(window) => self.backend.swap_buffers(&window.surface),
            None => Ok(()),
        }
    }

    /// The last known position and size of the window.
    pub fn window_rect(&self, id: WindowId) -> Option<Rect> {
        self.windows.get(id).map(|window| window.state.rect())
    }

    /// The title of the window.
    pub fn window_title(&self, id: WindowId) -> Option<&str> {
        self.windows.get(id).map(|window| window.state.title())
    }

    /// Whether a close was requested. Unknown windows are always closing.
    pub fn window_should_close(&self, id: WindowId) -> bool {
        self.windows.get(id).map_or(true, |window| window.state.should_close())
    }

    /// Raise or clear the close request flag.
    pub fn set_window_should_close(&mut self, id: WindowId, should_close: bool) {
        if let Some(window) = self.windows.get_mut(id) {
            window.state.set_should_close(should_close);
        }
    }

    /// Move the window. Negative coordinates are ignored.
    pub fn set_window_origin(&mut self, id: WindowId, x: i32, y: i32) {
        if x < 0 || y < 0 {
            return;
        }

        if let Some(window) = self.windows.get_mut(id) {
            self.backend.set_origin(&window.surface, x, y);
            window.state.rect.x = x;
            window.state.rect.y = y;
        }
    }

    /// Resize the drawable area of the window. Negative sizes are ignored.
    pub fn set_window_size(&mut self, id: WindowId, width: i32, height: i32) {
        if width < 0 || height < 0 {
            return;
        }

        if let Some(window) = self.windows.get_mut(id) {
            self.backend.set_size(&window.surface, width, height);
            window.state.rect.width = width;
            window.state.rect.height = height;
        }
    }

    /// Change the title of the window. Titles with a NUL byte are ignored.
    pub fn set_window_title(&mut self, id: WindowId, title: &str) {
        if title.contains('\0') {
            return;
        }

        if let Some(window) = self.windows.get_mut(id) {
            self.backend.set_title(&window.surface, title);
            window.state.title = title.to_owned();
        }
    }

    /// The address of an OpenGL function, for use by a GL loader.
    ///
    /// Null when the backend isn't bootstrapped or doesn't know the
    /// function. Some platforms require a current context.
    pub fn get_proc_address(&self, name: &str) -> *const c_void {
        if !self.context.bootstrapped {
            return std::ptr::null();
        }

        match CString::new(name) {
            Ok(name) => self.backend.get_proc_address(&name),
            Err(_) => std::ptr::null(),
        }
    }

    /// The raw handle of the native window.
    pub fn raw_window_handle(&self, id: WindowId) -> Option<RawWindowHandle> {
        self.windows.get(id).and_then(|window| self.backend.raw_window_handle(&window.surface))
    }

    /// The raw handle of the native display.
    pub fn raw_display_handle(&self) -> Option<RawDisplayHandle> {
        if !self.context.bootstrapped {
            return None;
        }

        self.backend.raw_display_handle()
    }
}

impl<B: Backend> Drop for Wtk<B> {
    fn drop(&mut self) {
        let ids: Vec<WindowId> = self.windows.keys().collect();
        for id in ids {
            self.delete_window(id);
        }

        self.quit();
    }
}

impl<B: Backend + fmt::Debug> fmt::Debug for Wtk<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wtk")
            .field("backend", &self.backend)
            .field("context", &self.context)
            .field("windows", &self.windows.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::HeadlessBackend;

    #[test]
    fn context_follows_windows() {
        let mut wtk = Wtk::new(HeadlessBackend::new());
        assert_eq!(*wtk.global_context(), GlobalContext::default());

        let a = wtk.create_window(WindowAttributes::new()).unwrap();
        let b = wtk.create_window(WindowAttributes::new()).unwrap();
        assert_eq!(wtk.live_windows(), 2);
        assert!(wtk.is_bootstrapped());

        wtk.delete_window(a);
        wtk.delete_window(a);
        assert_eq!(wtk.live_windows(), 1);

        wtk.delete_window(b);
        assert_eq!(*wtk.global_context(), GlobalContext::default());
    }

    #[test]
    fn stale_ids_are_rejected() {
        let mut wtk = Wtk::new(HeadlessBackend::new());
        let id = wtk.create_window(WindowAttributes::new()).unwrap();
        wtk.delete_window(id);

        assert!(wtk.window_should_close(id));
        assert_eq!(wtk.window_rect(id), None);
        assert!(wtk.make_current(id).is_ok());
        wtk.set_window_size(id, 10, 10);
        assert!(wtk.backend().calls().set_size.is_empty());
    }

    #[test]
    fn proc_address_needs_bootstrap() {
        let mut wtk = Wtk::new(HeadlessBackend::new());
        assert!(wtk.get_proc_address("glClear").is_null());

        wtk.init().unwrap();
        assert!(!wtk.get_proc_address("glClear").is_null());
        assert!(wtk.get_proc_address("gl\0Clear").is_null());
        assert!(wtk.get_proc_address("glUnknown").is_null());
    }
}
