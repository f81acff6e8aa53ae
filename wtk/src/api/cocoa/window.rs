use std::fmt;
use std::ptr::NonNull;

use log::{debug, trace};
use objc2::rc::{autoreleasepool, Retained, Weak};
use objc2::runtime::ProtocolObject;
use objc2::{define_class, msg_send, DefinedClass, MainThreadOnly};
use objc2_app_kit::{
    NSBackingStoreType, NSOpenGLContext, NSOpenGLPixelFormat, NSScreen, NSWindow,
    NSWindowDelegate, NSWindowStyleMask,
};
use objc2_foundation::{
    MainThreadMarker, NSNotification, NSObject, NSObjectProtocol, NSPoint, NSRect, NSSize, NSString,
};

use crate::config::ConfigTemplate;
use crate::error::{ErrorKind, Result};
use crate::event::NativeEvent;
use crate::window::{WindowAttributes, WindowId};

use super::EventQueue;

// Pixel format attributes from `NSOpenGL.h`.
type NSOpenGLPixelFormatAttribute = u32;
const NS_OPENGL_PFA_DOUBLE_BUFFER: NSOpenGLPixelFormatAttribute = 5;
const NS_OPENGL_PFA_COLOR_SIZE: NSOpenGLPixelFormatAttribute = 8;
const NS_OPENGL_PFA_ALPHA_SIZE: NSOpenGLPixelFormatAttribute = 11;
const NS_OPENGL_PFA_DEPTH_SIZE: NSOpenGLPixelFormatAttribute = 12;
const NS_OPENGL_PFA_STENCIL_SIZE: NSOpenGLPixelFormatAttribute = 13;
const NS_OPENGL_PFA_ACCELERATED: NSOpenGLPixelFormatAttribute = 73;
const NS_OPENGL_PFA_OPENGL_PROFILE: NSOpenGLPixelFormatAttribute = 99;

const NS_OPENGL_PROFILE_VERSION_LEGACY: NSOpenGLPixelFormatAttribute = 0x1000;
const NS_OPENGL_PROFILE_VERSION_3_2_CORE: NSOpenGLPixelFormatAttribute = 0x3200;
const NS_OPENGL_PROFILE_VERSION_4_1_CORE: NSOpenGLPixelFormatAttribute = 0x4100;

pub(crate) struct DelegateIvars {
    id: WindowId,
    queue: EventQueue,
    window: Weak<NSWindow>,
    context: Weak<NSOpenGLContext>,
}

define_class!(
    /// Reports the window level notifications of a single window.
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "WtkWindowDelegate"]
    #[ivars = DelegateIvars]
    pub(crate) struct WindowDelegate;

    unsafe impl NSObjectProtocol for WindowDelegate {}

    unsafe impl NSWindowDelegate for WindowDelegate {
        #[unsafe(method(windowShouldClose:))]
        fn window_should_close(&self, _sender: &NSWindow) -> bool {
            self.push(NativeEvent::CloseRequested);
            // The window stays until the application deletes it.
            false
        }

        #[unsafe(method(windowDidResize:))]
        fn window_did_resize(&self, _notification: &NSNotification) {
            if let Some(context) = self.ivars().context.load() {
                context.update();
            }

            if let Some(window) = self.ivars().window.load() {
                let size = content_rect(&window).size;
                let (width, height) = (size.width.round() as i32, size.height.round() as i32);
                self.push(NativeEvent::Resized { width, height });
            }
        }

        #[unsafe(method(windowDidMove:))]
        fn window_did_move(&self, _notification: &NSNotification) {
            if let Some(window) = self.ivars().window.load() {
                let (x, y) = top_left(&window, self.mtm());
                self.push(NativeEvent::Moved { x, y });
            }
        }

        #[unsafe(method(windowDidBecomeKey:))]
        fn window_did_become_key(&self, _notification: &NSNotification) {
            self.push(NativeEvent::FocusIn);
        }

        #[unsafe(method(windowDidResignKey:))]
        fn window_did_resign_key(&self, _notification: &NSNotification) {
            self.push(NativeEvent::FocusOut);
        }
    }
);

impl WindowDelegate {
    fn new(
        mtm: MainThreadMarker,
        id: WindowId,
        queue: EventQueue,
        window: &NSWindow,
        context: &NSOpenGLContext,
    ) -> Retained<Self> {
        let ivars = DelegateIvars {
            id,
            queue,
            window: Weak::new(window),
            context: Weak::new(context),
        };
        let this = Self::alloc(mtm).set_ivars(ivars);
        unsafe { msg_send![super(this), init] }
    }

    fn push(&self, event: NativeEvent) {
        let ivars = self.ivars();
        trace!("queued {event:?} for {:?}", ivars.id);
        ivars.queue.borrow_mut().push_back((ivars.id, event));
    }
}

/// An AppKit window whose content view is drawn by an `NSOpenGLContext`.
pub struct CocoaSurface {
    context: Retained<NSOpenGLContext>,
    delegate: Retained<WindowDelegate>,
    window: Retained<NSWindow>,
    pub(crate) id: WindowId,
}

impl CocoaSurface {
    pub(crate) fn new(
        mtm: MainThreadMarker,
        id: WindowId,
        queue: &EventQueue,
        attributes: &WindowAttributes,
    ) -> Result<Self> {
        autoreleasepool(|_| {
            let format = pixel_format(attributes.config())?;
            let context = NSOpenGLContext::initWithFormat_shareContext(
                NSOpenGLContext::alloc(),
                &format,
                None,
            )
            .ok_or(ErrorKind::BadContext)?;

            let rect = attributes.rect();
            let origin_y = flip_y(screen_height(mtm), f64::from(rect.y), f64::from(rect.height));
            let content_rect = NSRect::new(
                NSPoint::new(f64::from(rect.x), origin_y),
                NSSize::new(f64::from(rect.width), f64::from(rect.height)),
            );
            let style = NSWindowStyleMask::Titled
                | NSWindowStyleMask::Closable
                | NSWindowStyleMask::Miniaturizable
                | NSWindowStyleMask::Resizable;

            let window = unsafe {
                NSWindow::initWithContentRect_styleMask_backing_defer(
                    NSWindow::alloc(mtm),
                    content_rect,
                    style,
                    NSBackingStoreType::Buffered,
                    false,
                )
            };

            let delegate = WindowDelegate::new(mtm, id, queue.clone(), &window, &context);
            unsafe {
                window.setReleasedWhenClosed(false);
                window.setDelegate(Some(ProtocolObject::from_ref(&*delegate)));
            }
            window.setTitle(&NSString::from_str(attributes.title()));
            window.setAcceptsMouseMovedEvents(true);

            // From here on the window is closed on drop.
            let surface = CocoaSurface { context, delegate, window, id };

            let view = surface.window.contentView().ok_or(ErrorKind::BadNativeWindow)?;
            unsafe {
                surface.context.setView(Some(&*view));
            }

            surface.window.makeKeyAndOrderFront(None);
            debug!("created AppKit window {}", surface.window_number());
            Ok(surface)
        })
    }

    pub(crate) fn window(&self) -> &NSWindow {
        &self.window
    }

    pub(crate) fn window_number(&self) -> isize {
        self.window.windowNumber()
    }

    /// The content view, the drawable of the context.
    pub(crate) fn view_ptr(&self) -> Option<NonNull<std::ffi::c_void>> {
        self.window.contentView().map(|view| NonNull::from(&*view).cast())
    }

    pub(crate) fn make_current(&self) {
        autoreleasepool(|_| self.context.makeCurrentContext());
    }

    pub(crate) fn swap_buffers(&self) {
        autoreleasepool(|_| self.context.flushBuffer());
    }

    pub(crate) fn set_origin(&self, x: i32, y: i32, mtm: MainThreadMarker) {
        let height = content_rect(&self.window).size.height;
        let origin_y = flip_y(screen_height(mtm), f64::from(y), height);
        let content = NSRect::new(NSPoint::new(f64::from(x), origin_y), NSSize::new(0.0, height));
        let frame = self.window.frameRectForContentRect(content);
        self.window.setFrameOrigin(frame.origin);
    }

    pub(crate) fn set_size(&self, width: i32, height: i32) {
        // Keep the top left corner in place.
        let mut content = content_rect(&self.window);
        content.origin.y += content.size.height - f64::from(height);
        content.size = NSSize::new(f64::from(width), f64::from(height));
        let frame = self.window.frameRectForContentRect(content);
        self.window.setFrame_display(frame, true);
    }

    pub(crate) fn set_title(&self, title: &str) {
        self.window.setTitle(&NSString::from_str(title));
    }
}

impl Drop for CocoaSurface {
    fn drop(&mut self) {
        if NSOpenGLContext::currentContext().is_some_and(|current| current == self.context) {
            NSOpenGLContext::clearCurrentContext();
        }

        unsafe {
            let _: () = msg_send![&*self.context, clearDrawable];
            self.window.setDelegate(None);
        }
        self.window.close();
    }
}

impl fmt::Debug for CocoaSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CocoaSurface")
            .field("id", &self.id)
            .field("window", &Retained::as_ptr(&self.window))
            .field("delegate", &Retained::as_ptr(&self.delegate))
            .field("context", &Retained::as_ptr(&self.context))
            .finish()
    }
}

/// The nearest AppKit profile for the requested version.
fn opengl_profile(template: &ConfigTemplate) -> NSOpenGLPixelFormatAttribute {
    match (template.version.major, template.version.minor) {
        (0..=2, _) | (3, 0..=1) => NS_OPENGL_PROFILE_VERSION_LEGACY,
        (3, _) => NS_OPENGL_PROFILE_VERSION_3_2_CORE,
        _ => NS_OPENGL_PROFILE_VERSION_4_1_CORE,
    }
}

fn pixel_format(template: &ConfigTemplate) -> Result<Retained<NSOpenGLPixelFormat>> {
    let mut attrs = vec![
        NS_OPENGL_PFA_OPENGL_PROFILE,
        opengl_profile(template),
        NS_OPENGL_PFA_ACCELERATED,
        NS_OPENGL_PFA_COLOR_SIZE,
        u32::from(template.total_color_bits()),
        NS_OPENGL_PFA_ALPHA_SIZE,
        u32::from(template.alpha_size),
        NS_OPENGL_PFA_DEPTH_SIZE,
        u32::from(template.depth_size),
        NS_OPENGL_PFA_STENCIL_SIZE,
        u32::from(template.stencil_size),
    ];

    if template.double_buffer {
        attrs.push(NS_OPENGL_PFA_DOUBLE_BUFFER);
    }

    // Terminate attrs with zero.
    attrs.push(0);

    let attrs = NonNull::new(attrs.as_mut_ptr()).ok_or(ErrorKind::BadConfig)?;
    unsafe { NSOpenGLPixelFormat::initWithAttributes(NSOpenGLPixelFormat::alloc(), attrs) }
        .ok_or_else(|| ErrorKind::BadConfig.into())
}

pub(crate) fn content_rect(window: &NSWindow) -> NSRect {
    window.contentRectForFrameRect(window.frame())
}

fn screen_height(mtm: MainThreadMarker) -> f64 {
    NSScreen::mainScreen(mtm).map_or(0.0, |screen| screen.frame().size.height)
}

/// The top left corner of the content of `window`, with the y axis pointing
/// down from the top of the main screen.
fn top_left(window: &NSWindow, mtm: MainThreadMarker) -> (i32, i32) {
    let content = content_rect(window);
    let y = flip_y(screen_height(mtm), content.origin.y, content.size.height);
    (content.origin.x.round() as i32, y.round() as i32)
}

/// Convert the y coordinate of a `height` tall rectangle between top left and
/// bottom left origins. The conversion is its own inverse.
pub(crate) fn flip_y(screen_height: f64, y: f64, height: f64) -> f64 {
    screen_height - y - height
}
