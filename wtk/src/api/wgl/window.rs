use std::cell::Cell;
use std::fmt;
use std::os::raw::c_int;
use std::ptr;

use glutin_wgl_sys::{wgl, wgl_extra};
use log::debug;
use windows_sys::Win32::Foundation::{HWND, RECT};
use windows_sys::Win32::Graphics::OpenGL::{self as gl, PIXELFORMATDESCRIPTOR};
use windows_sys::Win32::UI::WindowsAndMessaging as wm;

use crate::config::{ConfigTemplate, GlProfile};
use crate::error::{Error, ErrorKind, Result};
use crate::window::{WindowAttributes, WindowId};

use super::{ContextWrapper, WglState, WindowData, WindowWrapper};

const STYLE: wm::WINDOW_STYLE = wm::WS_OVERLAPPEDWINDOW | wm::WS_CLIPSIBLINGS | wm::WS_CLIPCHILDREN;
const EX_STYLE: wm::WINDOW_EX_STYLE = wm::WS_EX_APPWINDOW;

/// Attaches the window data to a window and detaches it on drop, before the
/// data is freed.
struct WindowDataGuard {
    hwnd: HWND,
    data: *mut WindowData,
}

impl WindowDataGuard {
    unsafe fn attach(hwnd: HWND, data: WindowData) -> Self {
        let data = Box::into_raw(Box::new(data));
        unsafe {
            wm::SetWindowLongPtrW(hwnd, wm::GWLP_USERDATA, data as isize);
        }
        WindowDataGuard { hwnd, data }
    }
}

impl Drop for WindowDataGuard {
    fn drop(&mut self) {
        unsafe {
            wm::SetWindowLongPtrW(self.hwnd, wm::GWLP_USERDATA, 0);
            drop(Box::from_raw(self.data));
        }
    }
}

/// A Win32 window with its device context and WGL context.
///
/// The fields are dropped in order: the context goes first, then the window
/// procedure loses access to the window data, then the window is destroyed.
pub struct WglSurface {
    context: ContextWrapper,
    _data: WindowDataGuard,
    window: WindowWrapper,
    pub(crate) id: WindowId,
}

impl WglSurface {
    pub(crate) unsafe fn new(
        state: &WglState,
        id: WindowId,
        attributes: &WindowAttributes,
    ) -> Result<Self> {
        let rect = attributes.rect();
        let (width, height) = frame_size(rect.width, rect.height);
        let window = unsafe {
            WindowWrapper::new(
                &state.class,
                attributes.title(),
                STYLE,
                EX_STYLE,
                (rect.x, rect.y, width, height),
            )?
        };

        let data = unsafe {
            WindowDataGuard::attach(
                window.0,
                WindowData { id, queue: state.queue.clone(), tracking_mouse: Cell::new(false) },
            )
        };

        unsafe {
            set_pixel_format(&state.extra, &window, attributes.config())?;
        }
        let context = unsafe { create_context(&state.extra, &window, attributes.config())? };

        unsafe {
            wm::ShowWindow(window.0, wm::SW_SHOW);
        }

        debug!("created Win32 window {:#x}", window.0);
        Ok(WglSurface { context, _data: data, window, id })
    }

    pub(crate) fn hwnd(&self) -> HWND {
        self.window.0
    }

    pub(crate) fn make_current(&self) -> Result<()> {
        unsafe {
            if wgl::MakeCurrent(self.window.1 as *const _, self.context.0) == 0 {
                return Err(Error::last_os_error(ErrorKind::BadAccess));
            }
        }

        Ok(())
    }

    pub(crate) fn swap_buffers(&self) -> Result<()> {
        unsafe {
            if gl::SwapBuffers(self.window.1) == 0 {
                return Err(Error::last_os_error(ErrorKind::BadSurface));
            }
        }

        Ok(())
    }

    pub(crate) fn set_origin(&self, x: i32, y: i32) {
        let flags = wm::SWP_NOSIZE | wm::SWP_NOZORDER | wm::SWP_NOACTIVATE;
        unsafe {
            wm::SetWindowPos(self.window.0, 0, x, y, 0, 0, flags);
        }
    }

    pub(crate) fn set_size(&self, width: i32, height: i32) {
        let (width, height) = frame_size(width, height);
        let flags = wm::SWP_NOMOVE | wm::SWP_NOZORDER | wm::SWP_NOACTIVATE;
        unsafe {
            wm::SetWindowPos(self.window.0, 0, 0, 0, width, height, flags);
        }
    }

    pub(crate) fn set_title(&self, title: &str) {
        let title = super::encode_wide(title);
        unsafe {
            wm::SetWindowTextW(self.window.0, title.as_ptr());
        }
    }
}

impl fmt::Debug for WglSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WglSurface")
            .field("id", &self.id)
            .field("hwnd", &self.window.0)
            .field("hdc", &self.window.1)
            .field("hglrc", &self.context.0)
            .finish()
    }
}

/// The outer size of a window whose drawable area is `width` by `height`.
fn frame_size(width: i32, height: i32) -> (i32, i32) {
    let mut rect = RECT { left: 0, top: 0, right: width, bottom: height };
    unsafe {
        wm::AdjustWindowRectEx(&mut rect, STYLE, 0, EX_STYLE);
    }
    (rect.right - rect.left, rect.bottom - rect.top)
}

unsafe fn set_pixel_format(
    extra: &wgl_extra::Wgl,
    window: &WindowWrapper,
    template: &ConfigTemplate,
) -> Result<()> {
    let attrs = [
        wgl_extra::DRAW_TO_WINDOW_ARB as c_int,
        1,
        wgl_extra::SUPPORT_OPENGL_ARB as c_int,
        1,
        wgl_extra::DOUBLE_BUFFER_ARB as c_int,
        c_int::from(template.double_buffer),
        wgl_extra::PIXEL_TYPE_ARB as c_int,
        wgl_extra::TYPE_RGBA_ARB as c_int,
        wgl_extra::ACCELERATION_ARB as c_int,
        wgl_extra::FULL_ACCELERATION_ARB as c_int,
        wgl_extra::COLOR_BITS_ARB as c_int,
        c_int::from(template.total_color_bits()),
        wgl_extra::ALPHA_BITS_ARB as c_int,
        c_int::from(template.alpha_size),
        wgl_extra::DEPTH_BITS_ARB as c_int,
        c_int::from(template.depth_size),
        wgl_extra::STENCIL_BITS_ARB as c_int,
        c_int::from(template.stencil_size),
        // Terminate attrs with zero.
        0,
    ];

    unsafe {
        let mut pixel_format = 0;
        let mut num_formats = 0;
        if extra.ChoosePixelFormatARB(
            window.1 as *const _,
            attrs.as_ptr().cast(),
            ptr::null(),
            1,
            &mut pixel_format,
            &mut num_formats,
        ) == 0
            || num_formats == 0
        {
            return Err(ErrorKind::BadConfig.into());
        }

        let mut descriptor: PIXELFORMATDESCRIPTOR = std::mem::zeroed();
        gl::DescribePixelFormat(
            window.1,
            pixel_format,
            std::mem::size_of::<PIXELFORMATDESCRIPTOR>() as u32,
            &mut descriptor,
        );

        if gl::SetPixelFormat(window.1, pixel_format, &descriptor) == 0 {
            return Err(Error::last_os_error(ErrorKind::BadConfig));
        }
    }

    Ok(())
}

unsafe fn create_context(
    extra: &wgl_extra::Wgl,
    window: &WindowWrapper,
    template: &ConfigTemplate,
) -> Result<ContextWrapper> {
    let profile = match template.profile {
        GlProfile::Core => wgl_extra::CONTEXT_CORE_PROFILE_BIT_ARB,
        GlProfile::Compatibility => wgl_extra::CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB,
    };

    let attrs = [
        wgl_extra::CONTEXT_MAJOR_VERSION_ARB as c_int,
        c_int::from(template.version.major),
        wgl_extra::CONTEXT_MINOR_VERSION_ARB as c_int,
        c_int::from(template.version.minor),
        wgl_extra::CONTEXT_PROFILE_MASK_ARB as c_int,
        profile as c_int,
        // Terminate list with zero.
        0,
    ];

    unsafe {
        let raw = extra.CreateContextAttribsARB(window.1 as _, ptr::null(), attrs.as_ptr());
        if raw.is_null() {
            Err(Error::last_os_error(ErrorKind::BadContext))
        } else {
            Ok(ContextWrapper(raw))
        }
    }
}
