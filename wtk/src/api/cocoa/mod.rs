//! AppKit windows with `NSOpenGLContext`s.
//!
//! Everything here must run on the main thread, [`CocoaBackend::init`] fails
//! anywhere else.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::ffi::{c_void, CStr};
use std::fmt;
use std::ptr;
use std::rc::Rc;

use log::{debug, trace};
use objc2::rc::{autoreleasepool, Retained};
use objc2::{sel, MainThreadOnly, Message};
use objc2_app_kit::{
    NSApplication, NSApplicationActivationPolicy, NSEvent, NSEventMask, NSEventType, NSMenu,
    NSMenuItem, NSWindow,
};
use objc2_core_foundation::{CFBundle, CFString};
use objc2_foundation::{ns_string, MainThreadMarker, NSDefaultRunLoopMode};
use raw_window_handle::{
    AppKitDisplayHandle, AppKitWindowHandle, RawDisplayHandle, RawWindowHandle,
};

use crate::backend::Backend;
use crate::error::{ErrorKind, Result};
use crate::event::{ElementState, KeyCode, NativeEvent};
use crate::window::{WindowAttributes, WindowId};

mod keyboard;
mod window;

pub use self::window::CocoaSurface;

type EventQueue = Rc<RefCell<VecDeque<(WindowId, NativeEvent)>>>;

/// A window known to the pump, keyed by its window number.
#[derive(Debug)]
struct TrackedWindow {
    id: WindowId,
    window: Retained<NSWindow>,
    cursor_inside: bool,
}

/// Process-wide resources living between `init` and `quit`.
struct CocoaState {
    mtm: MainThreadMarker,
    app: Retained<NSApplication>,
    queue: EventQueue,
    windows: HashMap<isize, TrackedWindow>,
}

impl fmt::Debug for CocoaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CocoaState")
            .field("app", &Retained::as_ptr(&self.app))
            .field("windows", &self.windows.len())
            .field("pending", &self.queue.borrow().len())
            .finish()
    }
}

impl CocoaState {
    /// Queue the events carried by `event`.
    ///
    /// Returns `true` when the event must not be forwarded to AppKit.
    fn translate(&mut self, event: &NSEvent) -> bool {
        let Some(tracked) = self.windows.get_mut(&event.windowNumber()) else {
            return false;
        };

        let id = tracked.id;
        let content = window::content_rect(&tracked.window);
        let mods = keyboard::modifiers(event.modifierFlags());
        let position = || {
            let location = event.locationInWindow();
            (location.x.round() as i32, (content.size.height - location.y).round() as i32)
        };

        let mut queue = self.queue.borrow_mut();
        let mut push = |native| queue.push_back((id, native));

        match event.r#type() {
            NSEventType::MouseMoved
            | NSEventType::LeftMouseDragged
            | NSEventType::RightMouseDragged
            | NSEventType::OtherMouseDragged => {
                let (x, y) = position();
                let inside = x >= 0
                    && y >= 0
                    && f64::from(x) < content.size.width
                    && f64::from(y) < content.size.height;
                if inside != tracked.cursor_inside {
                    tracked.cursor_inside = inside;
                    push(if inside { NativeEvent::CursorEntered } else { NativeEvent::CursorLeft });
                }

                let buttons = keyboard::held_buttons(NSEvent::pressedMouseButtons());
                push(NativeEvent::CursorMoved { x, y, buttons, mods });
            },
            kind @ (NSEventType::LeftMouseDown
            | NSEventType::RightMouseDown
            | NSEventType::OtherMouseDown
            | NSEventType::LeftMouseUp
            | NSEventType::RightMouseUp
            | NSEventType::OtherMouseUp) => {
                let state = match kind {
                    NSEventType::LeftMouseDown
                    | NSEventType::RightMouseDown
                    | NSEventType::OtherMouseDown => ElementState::Pressed,
                    _ => ElementState::Released,
                };

                if let Some(button) = keyboard::button(event.buttonNumber()) {
                    let (x, y) = position();
                    push(NativeEvent::Button { state, button, x, y, mods });
                }
            },
            NSEventType::ScrollWheel => {
                let dx = event.scrollingDeltaX().round() as i32;
                let dy = event.scrollingDeltaY().round() as i32;
                if dx != 0 || dy != 0 {
                    push(NativeEvent::Scroll { dx, dy });
                }
            },
            kind @ (NSEventType::KeyDown | NSEventType::KeyUp) => {
                let state = if kind == NSEventType::KeyDown {
                    ElementState::Pressed
                } else {
                    ElementState::Released
                };

                let scancode = event.keyCode();
                let keycode = keyboard::virtual_key_to_keycode(scancode).or_else(|| {
                    let characters = event.charactersIgnoringModifiers()?.to_string();
                    characters.chars().next().map(KeyCode::from)
                });

                if let Some(keycode) = keycode {
                    let scancode = u32::from(scancode);
                    push(NativeEvent::Key { state, keycode, scancode, mods, position: None });
                }

                // AppKit beeps at key events no responder handles.
                return !keyboard::is_menu_chord(mods);
            },
            NSEventType::FlagsChanged => {
                let scancode = event.keyCode();
                let keycode = keyboard::virtual_key_to_keycode(scancode);
                if let (Some(keycode), Some(flag)) = (keycode, keyboard::modifier_of_key(scancode))
                {
                    let state = if mods.contains(flag) {
                        ElementState::Pressed
                    } else {
                        ElementState::Released
                    };
                    let scancode = u32::from(scancode);
                    push(NativeEvent::Key { state, keycode, scancode, mods, position: None });
                }
            },
            _ => (),
        }

        false
    }
}

/// An application menu holding only "Quit", bound to Cmd+Q.
fn install_menu(mtm: MainThreadMarker, app: &NSApplication) {
    let app_menu = NSMenu::new(mtm);
    let quit = unsafe {
        NSMenuItem::initWithTitle_action_keyEquivalent(
            NSMenuItem::alloc(mtm),
            ns_string!("Quit"),
            Some(sel!(terminate:)),
            ns_string!("q"),
        )
    };
    app_menu.addItem(&quit);

    let app_item = NSMenuItem::new(mtm);
    app_item.setSubmenu(Some(&app_menu));

    let menubar = NSMenu::new(mtm);
    menubar.addItem(&app_item);
    app.setMainMenu(Some(&menubar));
    trace!("installed the application menu");
}

/// The AppKit backend.
#[derive(Debug, Default)]
pub struct CocoaBackend {
    state: Option<CocoaState>,
}

impl CocoaBackend {
    pub fn new() -> Self {
        Default::default()
    }

    fn state(&self) -> Result<&CocoaState> {
        self.state.as_ref().ok_or_else(|| ErrorKind::BadDisplay.into())
    }
}

impl Backend for CocoaBackend {
    type Surface = CocoaSurface;

    fn init(&mut self) -> Result<()> {
        let mtm = MainThreadMarker::new()
            .ok_or(ErrorKind::NotSupported("AppKit must be used from the main thread"))?;

        let app = NSApplication::sharedApplication(mtm);
        app.setActivationPolicy(NSApplicationActivationPolicy::Regular);
        if app.mainMenu().is_none() {
            install_menu(mtm, &app);
        }
        #[allow(deprecated)]
        app.activateIgnoringOtherApps(true);
        unsafe {
            app.finishLaunching();
        }

        debug!("initialized the shared NSApplication");
        self.state = Some(CocoaState {
            mtm,
            app,
            queue: Default::default(),
            windows: HashMap::new(),
        });
        Ok(())
    }

    fn quit(&mut self) {
        // The shared application lives as long as the process.
        self.state = None;
    }

    fn create_window(
        &mut self,
        id: WindowId,
        attributes: &WindowAttributes,
    ) -> Result<Self::Surface> {
        let state = self.state.as_mut().ok_or(ErrorKind::BadDisplay)?;
        let surface = CocoaSurface::new(state.mtm, id, &state.queue, attributes)?;

        let window = surface.window().retain();
        state
            .windows
            .insert(surface.window_number(), TrackedWindow { id, window, cursor_inside: false });
        Ok(surface)
    }

    fn destroy_window(&mut self, surface: Self::Surface) {
        let id = surface.id;
        if let Some(state) = self.state.as_mut() {
            state.windows.remove(&surface.window_number());
        }

        drop(surface);

        // Closing may have notified the delegate one last time.
        if let Some(state) = self.state.as_ref() {
            state.queue.borrow_mut().retain(|(queued, _)| *queued != id);
        }
    }

    fn poll_events(&mut self, sink: &mut dyn FnMut(WindowId, NativeEvent)) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        autoreleasepool(|_| loop {
            let event = unsafe {
                state.app.nextEventMatchingMask_untilDate_inMode_dequeue(
                    NSEventMask::Any,
                    None,
                    NSDefaultRunLoopMode,
                    true,
                )
            };

            let Some(event) = event else {
                break;
            };

            if !state.translate(&event) {
                state.app.sendEvent(&event);
            }
        });

        loop {
            let next = state.queue.borrow_mut().pop_front();
            match next {
                Some((id, event)) => sink(id, event),
                None => break,
            }
        }
    }

    fn make_current(&mut self, surface: &Self::Surface) -> Result<()> {
        surface.make_current();
        Ok(())
    }

    fn swap_buffers(&mut self, surface: &Self::Surface) -> Result<()> {
        surface.swap_buffers();
        Ok(())
    }

    fn set_origin(&mut self, surface: &Self::Surface, x: i32, y: i32) {
        if let Ok(state) = self.state() {
            surface.set_origin(x, y, state.mtm);
        }
    }

    fn set_size(&mut self, surface: &Self::Surface, width: i32, height: i32) {
        surface.set_size(width, height);
    }

    fn set_title(&mut self, surface: &Self::Surface, title: &str) {
        surface.set_title(title);
    }

    fn get_proc_address(&self, name: &CStr) -> *const c_void {
        if self.state.is_none() {
            return ptr::null();
        }

        let Ok(name) = name.to_str() else {
            trace!("GL function names are ASCII");
            return ptr::null();
        };

        let symbol_name = CFString::from_str(name);
        let framework_name = CFString::from_static_str("com.apple.opengl");
        unsafe {
            match CFBundle::bundle_with_identifier(Some(&framework_name)) {
                Some(framework) => {
                    framework.function_pointer_for_name(Some(&symbol_name)).cast_const()
                },
                None => ptr::null(),
            }
        }
    }

    fn raw_window_handle(&self, surface: &Self::Surface) -> Option<RawWindowHandle> {
        let view = surface.view_ptr()?;
        Some(RawWindowHandle::AppKit(AppKitWindowHandle::new(view)))
    }

    fn raw_display_handle(&self) -> Option<RawDisplayHandle> {
        self.state.as_ref().map(|_| RawDisplayHandle::AppKit(AppKitDisplayHandle::new()))
    }
}
