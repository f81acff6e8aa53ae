//! Win32 windows with WGL contexts.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::ffi::{c_void, CStr, CString, OsStr};
use std::fmt;
use std::num::NonZeroIsize;
use std::os::windows::ffi::OsStrExt;
use std::ptr;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use glutin_wgl_sys::{wgl, wgl_extra};
use log::{debug, trace};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle, Win32WindowHandle, WindowsDisplayHandle};
use windows_sys::Win32::Foundation::{FreeLibrary, HINSTANCE, HMODULE, HWND, LPARAM, LRESULT, WPARAM};
use windows_sys::Win32::Graphics::Gdi::{self as gdi, HDC};
use windows_sys::Win32::Graphics::OpenGL::{self as gl, PIXELFORMATDESCRIPTOR};
use windows_sys::Win32::System::LibraryLoader as dll_loader;
use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
    TrackMouseEvent, TME_LEAVE, TRACKMOUSEEVENT, VIRTUAL_KEY,
};
use windows_sys::Win32::UI::WindowsAndMessaging as wm;

use crate::backend::Backend;
use crate::error::{Error, ErrorKind, Result};
use crate::event::{Button, ElementState, Modifiers, NativeEvent};
use crate::window::{WindowAttributes, WindowId};

mod keyboard;
mod make_current_guard;
mod window;

pub use self::window::WglSurface;

use self::make_current_guard::CurrentContextGuard;

/// One notch of the mouse wheel.
const WHEEL_DELTA: i32 = 120;

type EventQueue = Rc<RefCell<VecDeque<(WindowId, NativeEvent)>>>;

/// Suffix of the next window class name. Class names are process-wide and
/// every backend owns its class.
static NEXT_CLASS: AtomicUsize = AtomicUsize::new(0);

/// A registered window class, unregistered on drop.
struct WindowClass {
    name: Vec<u16>,
    instance: HINSTANCE,
}

impl WindowClass {
    /// Register a class under a name no other backend of the process uses.
    unsafe fn register_unique() -> Result<Self> {
        let serial = NEXT_CLASS.fetch_add(1, Ordering::Relaxed);
        unsafe { Self::register(&format!("wtk-{serial}")) }
    }

    unsafe fn register(name: &str) -> Result<Self> {
        let name = encode_wide(name);
        unsafe {
            let instance = dll_loader::GetModuleHandleW(ptr::null());

            let mut class: wm::WNDCLASSEXW = std::mem::zeroed();
            class.cbSize = std::mem::size_of::<wm::WNDCLASSEXW>() as u32;
            class.style = wm::CS_OWNDC | wm::CS_HREDRAW | wm::CS_VREDRAW;
            class.lpfnWndProc = Some(window_proc);
            class.hInstance = instance;
            class.hCursor = wm::LoadCursorW(0, wm::IDC_ARROW);
            class.lpszClassName = name.as_ptr();

            if wm::RegisterClassExW(&class) == 0 {
                return Err(Error::last_os_error(ErrorKind::InitializationFailed));
            }

            Ok(WindowClass { name, instance })
        }
    }
}

impl Drop for WindowClass {
    fn drop(&mut self) {
        unsafe {
            wm::UnregisterClassW(self.name.as_ptr(), self.instance);
        }
    }
}

/// A loaded module, freed on drop.
#[derive(Debug)]
struct LibraryWrapper(HMODULE);

impl LibraryWrapper {
    unsafe fn load(name: &str) -> Result<Self> {
        let name = encode_wide(name);
        let module = unsafe { dll_loader::LoadLibraryW(name.as_ptr()) };
        if module == 0 {
            return Err(Error::last_os_error(ErrorKind::NotFound));
        }

        Ok(LibraryWrapper(module))
    }
}

impl Drop for LibraryWrapper {
    fn drop(&mut self) {
        unsafe {
            FreeLibrary(self.0);
        }
    }
}

/// A simple wrapper that destroys the window when it is destroyed.
#[derive(Debug)]
struct WindowWrapper(HWND, HDC);

impl WindowWrapper {
    unsafe fn new(
        class: &WindowClass,
        title: &str,
        style: wm::WINDOW_STYLE,
        ex_style: wm::WINDOW_EX_STYLE,
        (x, y, width, height): (i32, i32, i32, i32),
    ) -> Result<Self> {
        let title = encode_wide(title);
        unsafe {
            let hwnd = wm::CreateWindowExW(
                ex_style,
                class.name.as_ptr(),
                title.as_ptr(),
                style,
                x,
                y,
                width,
                height,
                0,
                0,
                class.instance,
                ptr::null(),
            );
            if hwnd == 0 {
                return Err(Error::last_os_error(ErrorKind::BadNativeWindow));
            }

            let hdc = gdi::GetDC(hwnd);
            if hdc == 0 {
                wm::DestroyWindow(hwnd);
                return Err(Error::last_os_error(ErrorKind::BadSurface));
            }

            Ok(WindowWrapper(hwnd, hdc))
        }
    }
}

impl Drop for WindowWrapper {
    #[inline]
    fn drop(&mut self) {
        unsafe {
            gdi::ReleaseDC(self.0, self.1);
            wm::DestroyWindow(self.0);
        }
    }
}

/// Wraps around a context so that it is destroyed when necessary.
#[derive(Debug)]
struct ContextWrapper(wgl::types::HGLRC);

impl Drop for ContextWrapper {
    #[inline]
    fn drop(&mut self) {
        unsafe {
            if wgl::GetCurrentContext() == self.0 {
                wgl::MakeCurrent(ptr::null(), ptr::null());
            }
            wgl::DeleteContext(self.0);
        }
    }
}

/// Process-wide resources living between `init` and `quit`.
struct WglState {
    class: WindowClass,
    extra: wgl_extra::Wgl,
    opengl32: LibraryWrapper,
    queue: EventQueue,
}

impl fmt::Debug for WglState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WglState")
            .field("instance", &self.class.instance)
            .field("opengl32", &self.opengl32.0)
            .field("pending", &self.queue.borrow().len())
            .finish()
    }
}

/// The Win32 and WGL backend.
#[derive(Debug, Default)]
pub struct WglBackend {
    state: Option<WglState>,
}

impl WglBackend {
    pub fn new() -> Self {
        Default::default()
    }

    fn state(&self) -> Result<&WglState> {
        self.state.as_ref().ok_or_else(|| ErrorKind::BadDisplay.into())
    }
}

impl Backend for WglBackend {
    type Surface = WglSurface;

    fn init(&mut self) -> Result<()> {
        let opengl32 = unsafe { LibraryWrapper::load("opengl32.dll")? };
        let class = unsafe { WindowClass::register_unique()? };
        let extra = unsafe { load_extra_functions(&class)? };

        if !extra.CreateContextAttribsARB.is_loaded() || !extra.ChoosePixelFormatARB.is_loaded() {
            return Err(ErrorKind::NotSupported("WGL_ARB_create_context is not supported").into());
        }

        debug!("loaded the WGL extensions");
        self.state = Some(WglState { class, extra, opengl32, queue: Default::default() });
        Ok(())
    }

    fn quit(&mut self) {
        self.state = None;
    }

    fn create_window(
        &mut self,
        id: WindowId,
        attributes: &WindowAttributes,
    ) -> Result<Self::Surface> {
        let state = self.state()?;
        unsafe { WglSurface::new(state, id, attributes) }
    }

    fn destroy_window(&mut self, surface: Self::Surface) {
        if let Some(state) = self.state.as_ref() {
            state.queue.borrow_mut().retain(|(id, _)| *id != surface.id);
        }
    }

    fn poll_events(&mut self, sink: &mut dyn FnMut(WindowId, NativeEvent)) {
        let Some(state) = self.state.as_ref() else {
            return;
        };

        unsafe {
            let mut msg: wm::MSG = std::mem::zeroed();
            while wm::PeekMessageW(&mut msg, 0, 0, 0, wm::PM_REMOVE) != 0 {
                wm::TranslateMessage(&msg);
                wm::DispatchMessageW(&msg);
            }
        }

        loop {
            let next = state.queue.borrow_mut().pop_front();
            match next {
                Some((id, event)) => sink(id, event),
                None => break,
            }
        }
    }

    fn make_current(&mut self, surface: &Self::Surface) -> Result<()> {
        surface.make_current()
    }

    fn swap_buffers(&mut self, surface: &Self::Surface) -> Result<()> {
        surface.swap_buffers()
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
        let Some(state) = self.state.as_ref() else {
            return ptr::null();
        };

        unsafe {
            let addr = wgl::GetProcAddress(name.as_ptr()) as isize;
            // Some drivers return small sentinels instead of null.
            if !matches!(addr, -1 | 0 | 1 | 2 | 3) {
                return addr as *const c_void;
            }

            // GL 1.1 functions are only exported by `opengl32.dll`.
            dll_loader::GetProcAddress(state.opengl32.0, name.as_ptr().cast())
                .map_or(ptr::null(), |f| f as *const c_void)
        }
    }

    fn raw_window_handle(&self, surface: &Self::Surface) -> Option<RawWindowHandle> {
        let mut handle = Win32WindowHandle::new(NonZeroIsize::new(surface.hwnd())?);
        handle.hinstance = self.state.as_ref().and_then(|s| NonZeroIsize::new(s.class.instance));
        Some(RawWindowHandle::Win32(handle))
    }

    fn raw_display_handle(&self) -> Option<RawDisplayHandle> {
        self.state.as_ref().map(|_| RawDisplayHandle::Windows(WindowsDisplayHandle::new()))
    }
}

/// Per window data reachable from the window procedure.
pub(crate) struct WindowData {
    id: WindowId,
    queue: EventQueue,
    tracking_mouse: Cell<bool>,
}

impl WindowData {
    fn push(&self, event: NativeEvent) {
        self.queue.borrow_mut().push_back((self.id, event));
    }
}

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let data = unsafe { wm::GetWindowLongPtrW(hwnd, wm::GWLP_USERDATA) } as *const WindowData;
    let Some(data) = (unsafe { data.as_ref() }) else {
        return unsafe { wm::DefWindowProcW(hwnd, msg, wparam, lparam) };
    };

    match msg {
        wm::WM_CLOSE => {
            data.push(NativeEvent::CloseRequested);
            // The window lives until it's deleted.
            return 0;
        },
        wm::WM_SIZE => {
            let (width, height) = (loword(lparam as usize), hiword(lparam as usize));
            data.push(NativeEvent::Resized { width: width.into(), height: height.into() });
        },
        wm::WM_MOVE => {
            let (x, y) = signed_position(lparam);
            data.push(NativeEvent::Moved { x, y });
        },
        wm::WM_SETFOCUS => data.push(NativeEvent::FocusIn),
        wm::WM_KILLFOCUS => data.push(NativeEvent::FocusOut),
        wm::WM_MOUSEMOVE => {
            if !data.tracking_mouse.get() {
                let mut track = TRACKMOUSEEVENT {
                    cbSize: std::mem::size_of::<TRACKMOUSEEVENT>() as u32,
                    dwFlags: TME_LEAVE,
                    hwndTrack: hwnd,
                    dwHoverTime: 0,
                };
                if unsafe { TrackMouseEvent(&mut track) } != 0 {
                    data.tracking_mouse.set(true);
                }
                data.push(NativeEvent::CursorEntered);
            }

            let (x, y) = signed_position(lparam);
            data.push(NativeEvent::CursorMoved {
                x,
                y,
                buttons: keyboard::held_buttons(wparam),
                mods: keyboard::current_modifiers(),
            });
        },
        wm::WM_MOUSELEAVE => {
            data.tracking_mouse.set(false);
            data.push(NativeEvent::CursorLeft);
        },
        wm::WM_MOUSEWHEEL => data.push(NativeEvent::Scroll { dx: 0, dy: wheel_steps(wparam) }),
        wm::WM_MOUSEHWHEEL => data.push(NativeEvent::Scroll { dx: wheel_steps(wparam), dy: 0 }),
        wm::WM_LBUTTONDOWN
        | wm::WM_LBUTTONUP
        | wm::WM_MBUTTONDOWN
        | wm::WM_MBUTTONUP
        | wm::WM_RBUTTONDOWN
        | wm::WM_RBUTTONUP
        | wm::WM_XBUTTONDOWN
        | wm::WM_XBUTTONUP => {
            let (button, state) = match msg {
                wm::WM_LBUTTONDOWN => (Button::LEFT, ElementState::Pressed),
                wm::WM_LBUTTONUP => (Button::LEFT, ElementState::Released),
                wm::WM_MBUTTONDOWN => (Button::MIDDLE, ElementState::Pressed),
                wm::WM_MBUTTONUP => (Button::MIDDLE, ElementState::Released),
                wm::WM_RBUTTONDOWN => (Button::RIGHT, ElementState::Pressed),
                wm::WM_RBUTTONUP => (Button::RIGHT, ElementState::Released),
                _ => {
                    let button = if hiword(wparam) == 1 { Button::BACK } else { Button::FORWARD };
                    let state = if msg == wm::WM_XBUTTONDOWN {
                        ElementState::Pressed
                    } else {
                        ElementState::Released
                    };
                    (button, state)
                },
            };

            let (x, y) = signed_position(lparam);
            data.push(NativeEvent::Button {
                state,
                button,
                x,
                y,
                mods: keyboard::current_modifiers(),
            });
        },
        wm::WM_KEYDOWN | wm::WM_SYSKEYDOWN | wm::WM_KEYUP | wm::WM_SYSKEYUP => {
            let state = if msg == wm::WM_KEYDOWN || msg == wm::WM_SYSKEYDOWN {
                ElementState::Pressed
            } else {
                ElementState::Released
            };
            let scancode = ((lparam >> 16) & 0xff) as u32;
            let extended = (lparam >> 24) & 1 != 0;
            let mods = keyboard::current_modifiers();
            let keycode = keyboard::virtual_key_to_keycode(
                wparam as VIRTUAL_KEY,
                scancode,
                extended,
                mods.contains(Modifiers::SHIFT),
            );

            data.push(NativeEvent::Key { state, keycode, scancode, mods, position: None });
        },
        _ => trace!("unhandled message {msg:#x}"),
    }

    unsafe { wm::DefWindowProcW(hwnd, msg, wparam, lparam) }
}

/// Load the WGL extension functions.
///
/// They're only reachable with a current context, so a throwaway window with
/// a legacy context is created for the lookup.
unsafe fn load_extra_functions(class: &WindowClass) -> Result<wgl_extra::Wgl> {
    let (ex_style, style) =
        (wm::WS_EX_APPWINDOW, wm::WS_POPUP | wm::WS_CLIPSIBLINGS | wm::WS_CLIPCHILDREN);

    // A dummy invisible window.
    let dummy_win = unsafe {
        WindowWrapper::new(
            class,
            "dummy window",
            style,
            ex_style,
            (wm::CW_USEDEFAULT, wm::CW_USEDEFAULT, 1, 1),
        )?
    };

    // Getting the pixel format that we will use and setting it.
    unsafe {
        let descriptor = dummy_pixel_format_descriptor();
        let id = gl::ChoosePixelFormat(dummy_win.1, &descriptor);
        if id == 0 {
            return Err(Error::last_os_error(ErrorKind::InitializationFailed));
        }

        if gl::SetPixelFormat(dummy_win.1, id, &descriptor) == 0 {
            return Err(Error::last_os_error(ErrorKind::InitializationFailed));
        }
    }

    // Creating the dummy OpenGL context and making it current.
    let dummy_ctx = unsafe {
        let raw = wgl::CreateContext(dummy_win.1 as *const _);
        if raw.is_null() {
            return Err(Error::last_os_error(ErrorKind::InitializationFailed));
        }
        ContextWrapper(raw)
    };
    let _current_context = unsafe { CurrentContextGuard::make_current(dummy_win.1, dummy_ctx.0)? };

    // Loading the extra WGL functions.
    Ok(wgl_extra::Wgl::load_with(|name| match CString::new(name) {
        Ok(name) => unsafe { wgl::GetProcAddress(name.as_ptr()) as *const c_void },
        Err(_) => ptr::null(),
    }))
}

/// A pixel format that is likely to be provided by the main video driver of
/// the system.
fn dummy_pixel_format_descriptor() -> PIXELFORMATDESCRIPTOR {
    let mut descriptor: PIXELFORMATDESCRIPTOR = unsafe { std::mem::zeroed() };
    descriptor.nSize = std::mem::size_of::<PIXELFORMATDESCRIPTOR>() as u16;
    descriptor.nVersion = 1;
    descriptor.dwFlags = gl::PFD_DRAW_TO_WINDOW | gl::PFD_SUPPORT_OPENGL | gl::PFD_DOUBLEBUFFER;
    descriptor.iPixelType = gl::PFD_TYPE_RGBA;
    descriptor.cColorBits = 32;
    descriptor.cAlphaBits = 8;
    descriptor.cDepthBits = 24;
    descriptor.cStencilBits = 8;
    descriptor
}

pub(crate) fn encode_wide(text: &str) -> Vec<u16> {
    OsStr::new(text).encode_wide().chain(Some(0)).collect()
}

fn loword(value: usize) -> u16 {
    (value & 0xffff) as u16
}

fn hiword(value: usize) -> u16 {
    ((value >> 16) & 0xffff) as u16
}

fn signed_position(lparam: LPARAM) -> (i32, i32) {
    let lparam = lparam as usize;
    (i32::from(loword(lparam) as i16), i32::from(hiword(lparam) as i16))
}

/// Whole wheel notches of a wheel message, at least one in the direction of
/// the motion.
fn wheel_steps(wparam: WPARAM) -> i32 {
    let delta = i32::from(hiword(wparam) as i16);
    match delta / WHEEL_DELTA {
        0 => delta.signum(),
        steps => steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_words() {
        let lparam = ((-5i16 as u16 as isize) << 16) | 300;
        assert_eq!(signed_position(lparam), (300, -5));
        assert_eq!(loword(0x0002_0001), 1);
        assert_eq!(hiword(0x0002_0001), 2);
    }

    #[test]
    fn backends_register_their_own_class() {
        let first = unsafe { WindowClass::register_unique() }.unwrap();
        let second = unsafe { WindowClass::register_unique() }.unwrap();
        assert_ne!(first.name, second.name);

        drop(first);
        let third = unsafe { WindowClass::register_unique() }.unwrap();
        assert_ne!(third.name, second.name);
    }

    #[test]
    fn missing_library() {
        let err = unsafe { LibraryWrapper::load("wtk-missing-library.dll") }.unwrap_err();
        assert_eq!(err.error_kind(), ErrorKind::NotFound);
    }

    #[test]
    fn wheel_notches() {
        let wparam = |delta: i16| (delta as u16 as usize) << 16;
        assert_eq!(wheel_steps(wparam(120)), 1);
        assert_eq!(wheel_steps(wparam(-240)), -2);
        assert_eq!(wheel_steps(wparam(30)), 1);
        assert_eq!(wheel_steps(wparam(0)), 0);
    }
}
