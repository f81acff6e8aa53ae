//! Xlib windows with GLX contexts.

use std::collections::HashMap;
use std::ffi::{c_void, CStr};
use std::fmt;
use std::os::raw::{c_char, c_int};
use std::ptr::{self, NonNull};
use std::rc::Rc;
use std::sync::atomic::{AtomicI32, Ordering};

use log::{debug, trace};
use once_cell::sync::Lazy;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle, XlibDisplayHandle, XlibWindowHandle};
use x11_dl::glx::{GLXContext, GLXFBConfig, Glx};
use x11_dl::xlib::{self, Display, XErrorEvent, XEvent, Xlib};

use crate::backend::Backend;
use crate::error::{Error, ErrorKind, Result};
use crate::event::{ElementState, NativeEvent};
use crate::window::{WindowAttributes, WindowId};

mod keyboard;
mod window;

pub use self::window::X11Surface;

use self::keyboard::ButtonAction;

/// The XLIB handle.
static XLIB: Lazy<Option<Xlib>> = Lazy::new(|| Xlib::open().ok());

/// The GLX handle.
static GLX: Lazy<Option<Glx>> = Lazy::new(|| Glx::open().ok());

/// The last error code reported by the Xlib error handler, zero when none.
static LAST_X_ERROR: AtomicI32 = AtomicI32::new(0);

// GLX_ARB_create_context.
const GLX_CONTEXT_MAJOR_VERSION_ARB: c_int = 0x2091;
const GLX_CONTEXT_MINOR_VERSION_ARB: c_int = 0x2092;
const GLX_CONTEXT_PROFILE_MASK_ARB: c_int = 0x9126;
const GLX_CONTEXT_CORE_PROFILE_BIT_ARB: c_int = 0x0001;
const GLX_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB: c_int = 0x0002;

type GlxCreateContextAttribsArb = unsafe extern "C" fn(
    *mut Display,
    GLXFBConfig,
    GLXContext,
    xlib::Bool,
    *const c_int,
) -> GLXContext;

type XErrorHandler = Option<unsafe extern "C" fn(*mut Display, *mut XErrorEvent) -> c_int>;

unsafe extern "C" fn x_error_handler(_display: *mut Display, event: *mut XErrorEvent) -> c_int {
    if let Some(event) = unsafe { event.as_ref() } {
        LAST_X_ERROR.store(c_int::from(event.error_code), Ordering::Relaxed);
    }

    0
}

/// The display connection shared by the backend and its windows.
///
/// The display is closed once the backend and every window let go of it.
pub(crate) struct XConnection {
    pub(crate) xlib: &'static Xlib,
    pub(crate) glx: &'static Glx,
    pub(crate) display: *mut Display,
    pub(crate) screen: c_int,
    pub(crate) root: xlib::Window,
    pub(crate) wm_delete_window: xlib::Atom,
    create_context_attribs: Option<GlxCreateContextAttribsArb>,
    previous_error_handler: Option<XErrorHandler>,
}

impl XConnection {
    fn open() -> Result<Self> {
        let xlib = XLIB.as_ref().ok_or(ErrorKind::NotFound)?;
        let glx = GLX.as_ref().ok_or(ErrorKind::NotFound)?;

        let display = unsafe { (xlib.XOpenDisplay)(ptr::null()) };
        if display.is_null() {
            return Err(ErrorKind::NotFound.into());
        }

        let (screen, root) = unsafe {
            let screen = (xlib.XDefaultScreen)(display);
            (screen, (xlib.XRootWindow)(display, screen))
        };

        // Closes the display on the early returns below.
        let mut conn = XConnection {
            xlib,
            glx,
            display,
            screen,
            root,
            wm_delete_window: 0,
            create_context_attribs: None,
            previous_error_handler: None,
        };

        unsafe {
            let (mut error_base, mut event_base) = (0, 0);
            if (glx.glXQueryExtension)(display, &mut error_base, &mut event_base) == 0 {
                return Err(ErrorKind::InitializationFailed.into());
            }

            let (mut major, mut minor) = (0, 0);
            if (glx.glXQueryVersion)(display, &mut major, &mut minor) == 0 {
                return Err(ErrorKind::InitializationFailed.into());
            }

            if (major, minor) < (1, 3) {
                return Err(ErrorKind::NotSupported("the glx below 1.3 isn't supported").into());
            }

            debug!("GLX {major}.{minor} on screen {screen}");

            conn.wm_delete_window =
                (xlib.XInternAtom)(display, b"WM_DELETE_WINDOW\0".as_ptr().cast(), xlib::False);
            if conn.wm_delete_window == 0 {
                return Err(ErrorKind::InitializationFailed.into());
            }

            conn.create_context_attribs =
                (glx.glXGetProcAddressARB)(b"glXCreateContextAttribsARB\0".as_ptr())
                    .map(|f| {
                        std::mem::transmute::<unsafe extern "C" fn(), GlxCreateContextAttribsArb>(f)
                    });

            if conn.create_context_attribs.is_none() {
                debug!("glXCreateContextAttribsARB is missing, contexts will be legacy ones");
            }

            conn.previous_error_handler = Some((xlib.XSetErrorHandler)(Some(x_error_handler)));
        }

        Ok(conn)
    }

    /// Run `callback` and turn any Xlib error it caused into an error of
    /// `kind`.
    pub(crate) fn last_x_error<T, F>(&self, kind: ErrorKind, callback: F) -> Result<T>
    where
        F: FnOnce() -> T,
    {
        LAST_X_ERROR.store(0, Ordering::Relaxed);

        let result = callback();

        unsafe {
            (self.xlib.XSync)(self.display, xlib::False);
        }

        match LAST_X_ERROR.swap(0, Ordering::Relaxed) {
            0 => Ok(result),
            code => Err(self.error_from_code(code, kind)),
        }
    }

    fn error_from_code(&self, code: c_int, kind: ErrorKind) -> Error {
        let mut buf = [0 as c_char; 256];
        let message = unsafe {
            (self.xlib.XGetErrorText)(self.display, code, buf.as_mut_ptr(), buf.len() as c_int);
            CStr::from_ptr(buf.as_ptr()).to_string_lossy().into_owned()
        };

        Error::new(Some(i64::from(code)), Some(message), kind)
    }

    pub(crate) fn create_context_attribs(&self) -> Option<GlxCreateContextAttribsArb> {
        self.create_context_attribs
    }
}

impl Drop for XConnection {
    fn drop(&mut self) {
        unsafe {
            if let Some(handler) = self.previous_error_handler.take() {
                (self.xlib.XSetErrorHandler)(handler);
            }

            (self.xlib.XCloseDisplay)(self.display);
        }
    }
}

impl fmt::Debug for XConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XConnection")
            .field("display", &self.display)
            .field("screen", &self.screen)
            .field("create_context_attribs", &self.create_context_attribs.is_some())
            .finish()
    }
}

/// The Xlib and GLX backend.
#[derive(Debug, Default)]
pub struct X11Backend {
    conn: Option<Rc<XConnection>>,
    windows: HashMap<xlib::Window, WindowId>,
}

impl X11Backend {
    pub fn new() -> Self {
        Default::default()
    }

    fn conn(&self) -> Result<&Rc<XConnection>> {
        self.conn.as_ref().ok_or_else(|| ErrorKind::BadDisplay.into())
    }
}

impl Backend for X11Backend {
    type Surface = X11Surface;

    fn init(&mut self) -> Result<()> {
        self.conn = Some(Rc::new(XConnection::open()?));
        Ok(())
    }

    fn quit(&mut self) {
        self.windows.clear();
        self.conn = None;
    }

    fn create_window(
        &mut self,
        id: WindowId,
        attributes: &WindowAttributes,
    ) -> Result<Self::Surface> {
        let conn = self.conn()?.clone();
        let surface = X11Surface::new(conn, attributes)?;
        self.windows.insert(surface.window, id);
        Ok(surface)
    }

    fn destroy_window(&mut self, surface: Self::Surface) {
        self.windows.remove(&surface.window);
    }

    fn poll_events(&mut self, sink: &mut dyn FnMut(WindowId, NativeEvent)) {
        let Some(conn) = self.conn.as_ref() else {
            return;
        };

        unsafe {
            while (conn.xlib.XPending)(conn.display) > 0 {
                let mut event: XEvent = std::mem::zeroed();
                (conn.xlib.XNextEvent)(conn.display, &mut event);

                let window = event.any.window;
                match self.windows.get(&window) {
                    Some(&id) => translate(conn, &event, &mut |native| sink(id, native)),
                    None => trace!("discarding event {} of window {window}", event.get_type()),
                }
            }
        }
    }

    fn make_current(&mut self, surface: &Self::Surface) -> Result<()> {
        surface.make_current()
    }

    fn swap_buffers(&mut self, surface: &Self::Surface) -> Result<()> {
        surface.swap_buffers();
        Ok(())
    }

    fn set_origin(&mut self, surface: &Self::Surface, x: i32, y: i32) {
        surface.set_origin(x, y);
    }

    fn set_size(&mut self, surface: &Self::Surface, width: i32, height: i32) {
        surface.set_size(width, height);
    }

    fn set_title(&mut self, surface: &Self::Surface, title: &str) {
        surface.set_title(title);
    }

    fn get_proc_address(&self, name: &CStr) -> *const c_void {
        let Some(glx) = GLX.as_ref() else {
            return ptr::null();
        };

        unsafe {
            (glx.glXGetProcAddressARB)(name.as_ptr().cast())
                .map_or(ptr::null(), |f| f as *const c_void)
        }
    }

    fn raw_window_handle(&self, surface: &Self::Surface) -> Option<RawWindowHandle> {
        Some(RawWindowHandle::Xlib(XlibWindowHandle::new(surface.window)))
    }

    fn raw_display_handle(&self) -> Option<RawDisplayHandle> {
        let conn = self.conn.as_ref()?;
        let handle = XlibDisplayHandle::new(NonNull::new(conn.display.cast()), conn.screen);
        Some(RawDisplayHandle::Xlib(handle))
    }
}

/// Translate an Xlib event into the native events it stands for.
///
/// # Safety
///
/// `event` must come from `XNextEvent` so its type tag matches its payload.
unsafe fn translate(conn: &XConnection, event: &XEvent, emit: &mut dyn FnMut(NativeEvent)) {
    match event.get_type() {
        ty @ (xlib::KeyPress | xlib::KeyRelease) => {
            let key = unsafe { event.key };
            let shift_level = c_int::from(key.state & xlib::ShiftMask != 0);
            let sym = unsafe {
                (conn.xlib.XkbKeycodeToKeysym)(conn.display, key.keycode as _, 0, shift_level)
            };

            emit(NativeEvent::Key {
                state: if ty == xlib::KeyPress {
                    ElementState::Pressed
                } else {
                    ElementState::Released
                },
                keycode: keyboard::keysym_to_keycode(sym as _),
                scancode: key.keycode,
                mods: keyboard::modifiers(key.state),
                position: Some((key.x, key.y)),
            });
        },
        ty @ (xlib::ButtonPress | xlib::ButtonRelease) => {
            let button = unsafe { event.button };
            let state = if ty == xlib::ButtonPress {
                ElementState::Pressed
            } else {
                ElementState::Released
            };

            match keyboard::button_action(button.button) {
                ButtonAction::Scroll { dx, dy } if state == ElementState::Pressed => {
                    emit(NativeEvent::Scroll { dx, dy })
                },
                ButtonAction::Scroll { .. } => (),
                ButtonAction::Press(index) => emit(NativeEvent::Button {
                    state,
                    button: index,
                    x: button.x,
                    y: button.y,
                    mods: keyboard::modifiers(button.state),
                }),
            }
        },
        xlib::MotionNotify => {
            let motion = unsafe { event.motion };
            emit(NativeEvent::CursorMoved {
                x: motion.x,
                y: motion.y,
                buttons: keyboard::held_buttons(motion.state),
                mods: keyboard::modifiers(motion.state),
            });
        },
        xlib::EnterNotify => emit(NativeEvent::CursorEntered),
        xlib::LeaveNotify => emit(NativeEvent::CursorLeft),
        xlib::FocusIn => emit(NativeEvent::FocusIn),
        xlib::FocusOut => emit(NativeEvent::FocusOut),
        xlib::ConfigureNotify => {
            let configure = unsafe { event.configure };
            emit(NativeEvent::Moved { x: configure.x, y: configure.y });
            emit(NativeEvent::Resized { width: configure.width, height: configure.height });
        },
        xlib::ClientMessage => {
            let message = unsafe { event.client_message };
            if message.data.get_long(0) as xlib::Atom == conn.wm_delete_window {
                emit(NativeEvent::CloseRequested);
            }
        },
        _ => (),
    }
}
