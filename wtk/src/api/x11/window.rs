use std::ffi::CString;
use std::fmt;
use std::os::raw::{c_int, c_uint};
use std::ptr;
use std::rc::Rc;

use log::{debug, warn};
use x11_dl::glx::{self, GLXContext, GLXFBConfig};
use x11_dl::xlib;

use crate::config::{ConfigTemplate, GlProfile};
use crate::error::{ErrorKind, Result};
use crate::window::WindowAttributes;

use super::XConnection;

const EVENT_MASK: std::os::raw::c_long = xlib::StructureNotifyMask
    | xlib::PointerMotionMask
    | xlib::ButtonPressMask
    | xlib::ButtonReleaseMask
    | xlib::KeyPressMask
    | xlib::KeyReleaseMask
    | xlib::EnterWindowMask
    | xlib::LeaveWindowMask
    | xlib::FocusChangeMask
    | xlib::ExposureMask;

/// An Xlib window with its colormap and GLX context.
///
/// Every part is released on drop, including the ones of a window whose
/// creation failed halfway.
pub struct X11Surface {
    conn: Rc<XConnection>,
    pub(crate) window: xlib::Window,
    colormap: xlib::Colormap,
    context: GLXContext,
}

impl X11Surface {
    pub(crate) fn new(conn: Rc<XConnection>, attributes: &WindowAttributes) -> Result<Self> {
        let mut surface = X11Surface { conn, window: 0, colormap: 0, context: ptr::null_mut() };
        let conn = surface.conn.clone();
        let (xlib, glx, display) = (conn.xlib, conn.glx, conn.display);
        let rect = attributes.rect();

        let fbconfig = choose_fbconfig(&conn, attributes.config())?;

        unsafe {
            let visual = (glx.glXGetVisualFromFBConfig)(display, fbconfig);
            if visual.is_null() {
                return Err(ErrorKind::BadConfig.into());
            }
            let (raw_visual, depth) = ((*visual).visual, (*visual).depth);
            (xlib.XFree)(visual.cast());

            surface.colormap =
                (xlib.XCreateColormap)(display, conn.root, raw_visual, xlib::AllocNone);

            let mut swa: xlib::XSetWindowAttributes = std::mem::zeroed();
            swa.event_mask = EVENT_MASK;
            swa.colormap = surface.colormap;

            surface.window = conn.last_x_error(ErrorKind::BadNativeWindow, || {
                (xlib.XCreateWindow)(
                    display,
                    conn.root,
                    rect.x,
                    rect.y,
                    rect.width as c_uint,
                    rect.height as c_uint,
                    0,
                    depth,
                    xlib::InputOutput as c_uint,
                    raw_visual,
                    xlib::CWColormap | xlib::CWEventMask,
                    &mut swa,
                )
            })?;
            if surface.window == 0 {
                return Err(ErrorKind::BadNativeWindow.into());
            }

            let mut protocols = [conn.wm_delete_window];
            if (xlib.XSetWMProtocols)(display, surface.window, protocols.as_mut_ptr(), 1) == 0 {
                return Err(ErrorKind::BadNativeWindow.into());
            }

            surface.context = create_context(&conn, fbconfig, attributes.config())?;
            if surface.context.is_null() {
                return Err(ErrorKind::BadContext.into());
            }
        }

        surface.set_title(attributes.title());

        unsafe {
            (xlib.XMapWindow)(display, surface.window);
            (xlib.XFlush)(display);
        }

        debug!("created X11 window {}", surface.window);
        Ok(surface)
    }

    pub(crate) fn make_current(&self) -> Result<()> {
        let conn = &self.conn;
        let made_current = conn.last_x_error(ErrorKind::BadAccess, || unsafe {
            (conn.glx.glXMakeContextCurrent)(conn.display, self.window, self.window, self.context)
        })?;

        if made_current == 0 {
            return Err(ErrorKind::BadAccess.into());
        }

        Ok(())
    }

    pub(crate) fn swap_buffers(&self) {
        unsafe {
            (self.conn.glx.glXSwapBuffers)(self.conn.display, self.window);
        }
    }

    pub(crate) fn set_origin(&self, x: i32, y: i32) {
        unsafe {
            (self.conn.xlib.XMoveWindow)(self.conn.display, self.window, x, y);
            (self.conn.xlib.XFlush)(self.conn.display);
        }
    }

    pub(crate) fn set_size(&self, width: i32, height: i32) {
        // Xlib rejects empty windows.
        let (width, height) = (width.max(1) as c_uint, height.max(1) as c_uint);
        unsafe {
            (self.conn.xlib.XResizeWindow)(self.conn.display, self.window, width, height);
            (self.conn.xlib.XFlush)(self.conn.display);
        }
    }

    pub(crate) fn set_title(&self, title: &str) {
        let title = match CString::new(title) {
            Ok(title) => title,
            Err(_) => {
                warn!("ignoring a window title with a NUL byte");
                return;
            },
        };

        unsafe {
            (self.conn.xlib.XStoreName)(self.conn.display, self.window, title.as_ptr());
            (self.conn.xlib.XFlush)(self.conn.display);
        }
    }
}

impl Drop for X11Surface {
    fn drop(&mut self) {
        let (xlib, glx, display) = (self.conn.xlib, self.conn.glx, self.conn.display);

        unsafe {
            if !self.context.is_null() {
                if (glx.glXGetCurrentContext)() == self.context {
                    (glx.glXMakeContextCurrent)(display, 0, 0, ptr::null_mut());
                }
                (glx.glXDestroyContext)(display, self.context);
            }

            if self.window != 0 {
                (xlib.XDestroyWindow)(display, self.window);
            }

            if self.colormap != 0 {
                (xlib.XFreeColormap)(display, self.colormap);
            }

            (xlib.XFlush)(display);
        }
    }
}

impl fmt::Debug for X11Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X11Surface")
            .field("window", &self.window)
            .field("colormap", &self.colormap)
            .field("context", &self.context)
            .finish()
    }
}

fn choose_fbconfig(conn: &XConnection, template: &ConfigTemplate) -> Result<GLXFBConfig> {
    let attrs = [
        glx::GLX_X_RENDERABLE,
        1,
        glx::GLX_DRAWABLE_TYPE,
        glx::GLX_WINDOW_BIT,
        glx::GLX_RENDER_TYPE,
        glx::GLX_RGBA_BIT,
        glx::GLX_RED_SIZE,
        c_int::from(template.color_size),
        glx::GLX_GREEN_SIZE,
        c_int::from(template.color_size),
        glx::GLX_BLUE_SIZE,
        c_int::from(template.color_size),
        glx::GLX_ALPHA_SIZE,
        c_int::from(template.alpha_size),
        glx::GLX_DEPTH_SIZE,
        c_int::from(template.depth_size),
        glx::GLX_STENCIL_SIZE,
        c_int::from(template.stencil_size),
        glx::GLX_DOUBLEBUFFER,
        c_int::from(template.double_buffer),
        // Terminate the list with X11 `None`.
        0,
    ];

    unsafe {
        let mut num_configs = 0;
        let configs = (conn.glx.glXChooseFBConfig)(
            conn.display,
            conn.screen,
            attrs.as_ptr(),
            &mut num_configs,
        );

        if configs.is_null() {
            return Err(ErrorKind::BadConfig.into());
        }

        // The configs are sorted best first.
        let config = if num_configs > 0 { Some(*configs) } else { None };
        (conn.xlib.XFree)(configs.cast());

        config.ok_or_else(|| ErrorKind::BadConfig.into())
    }
}

fn create_context(
    conn: &XConnection,
    fbconfig: GLXFBConfig,
    template: &ConfigTemplate,
) -> Result<GLXContext> {
    let Some(create_context_attribs) = conn.create_context_attribs() else {
        return conn.last_x_error(ErrorKind::BadContext, || unsafe {
            (conn.glx.glXCreateNewContext)(
                conn.display,
                fbconfig,
                glx::GLX_RGBA_TYPE,
                ptr::null_mut(),
                // Direct context.
                1,
            )
        });
    };

    let profile = match template.profile {
        GlProfile::Core => super::GLX_CONTEXT_CORE_PROFILE_BIT_ARB,
        GlProfile::Compatibility => super::GLX_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB,
    };

    let attrs = [
        super::GLX_CONTEXT_MAJOR_VERSION_ARB,
        c_int::from(template.version.major),
        super::GLX_CONTEXT_MINOR_VERSION_ARB,
        c_int::from(template.version.minor),
        super::GLX_CONTEXT_PROFILE_MASK_ARB,
        profile,
        // Terminate list with zero.
        0,
    ];

    conn.last_x_error(ErrorKind::BadContext, || unsafe {
        create_context_attribs(
            conn.display,
            fbconfig,
            ptr::null_mut(),
            // Direct context.
            1,
            attrs.as_ptr(),
        )
    })
}
