//! An in-memory backend without any native window.
//!
//! It records every call the toolkit makes and lets the caller queue native
//! events, which makes the lifecycle and the event translation observable
//! without a display server.

use std::collections::VecDeque;
use std::ffi::{c_void, CStr};

use log::debug;

use crate::backend::Backend;
use crate::error::{ErrorKind, Result};
use crate::event::NativeEvent;
use crate::window::{Rect, WindowAttributes, WindowId};

/// GL functions the headless backend pretends to know.
const KNOWN_FUNCTIONS: &[&str] =
    &["glClear", "glClearColor", "glDrawArrays", "glGetString", "glViewport"];

extern "C" fn headless_gl_stub() {}

/// Calls received by a [`HeadlessBackend`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Calls {
    pub init: usize,
    pub quit: usize,
    pub created: Vec<WindowId>,
    pub destroyed: Vec<WindowId>,
    pub make_current: Vec<WindowId>,
    pub swap_buffers: Vec<WindowId>,
    pub set_origin: Vec<(WindowId, i32, i32)>,
    pub set_size: Vec<(WindowId, i32, i32)>,
    pub set_title: Vec<(WindowId, String)>,
}

/// The window of a [`HeadlessBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessSurface {
    id: WindowId,
    title: String,
    rect: Rect,
}

impl HeadlessSurface {
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// The title given on creation.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The geometry given on creation.
    pub fn rect(&self) -> Rect {
        self.rect
    }
}

/// A backend recording calls instead of talking to a windowing system.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    calls: Calls,
    initialized: bool,
    pending: VecDeque<(WindowId, NativeEvent)>,
    fail_init: Option<ErrorKind>,
    fail_create: Option<ErrorKind>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Default::default()
    }

    /// Calls received so far.
    pub fn calls(&self) -> &Calls {
        &self.calls
    }

    /// Whether the backend is between `init` and `quit`.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Make the next `init` fail with `kind`.
    pub fn fail_next_init(&mut self, kind: ErrorKind) {
        self.fail_init = Some(kind);
    }

    /// Make the next `create_window` fail with `kind`.
    pub fn fail_next_create(&mut self, kind: ErrorKind) {
        self.fail_create = Some(kind);
    }

    /// Queue a native event for the next poll.
    pub fn push_event(&mut self, id: WindowId, event: NativeEvent) {
        self.pending.push_back((id, event));
    }

    /// Number of events waiting for the next poll.
    pub fn pending_events(&self) -> usize {
        self.pending.len()
    }
}

impl Backend for HeadlessBackend {
    type Surface = HeadlessSurface;

    fn init(&mut self) -> Result<()> {
        if let Some(kind) = self.fail_init.take() {
            return Err(kind.into());
        }

        self.calls.init += 1;
        self.initialized = true;
        Ok(())
    }

    fn quit(&mut self) {
        self.calls.quit += 1;
        self.initialized = false;

        if !self.pending.is_empty() {
            debug!("dropping {} undelivered events", self.pending.len());
            self.pending.clear();
        }
    }

    fn create_window(
        &mut self,
        id: WindowId,
        attributes: &WindowAttributes,
    ) -> Result<Self::Surface> {
        if !self.initialized {
            return Err(ErrorKind::BadDisplay.into());
        }

        if let Some(kind) = self.fail_create.take() {
            return Err(kind.into());
        }

        self.calls.created.push(id);
        Ok(HeadlessSurface { id, title: attributes.title().to_owned(), rect: attributes.rect() })
    }

    fn destroy_window(&mut self, surface: Self::Surface) {
        self.pending.retain(|(id, _)| *id != surface.id);
        self.calls.destroyed.push(surface.id);
    }

    fn poll_events(&mut self, sink: &mut dyn FnMut(WindowId, NativeEvent)) {
        while let Some((id, event)) = self.pending.pop_front() {
            sink(id, event);
        }
    }

    fn make_current(&mut self, surface: &Self::Surface) -> Result<()> {
        self.calls.make_current.push(surface.id);
        Ok(())
    }

    fn swap_buffers(&mut self, surface: &Self::Surface) -> Result<()> {
        self.calls.swap_buffers.push(surface.id);
        Ok(())
    }

    fn set_origin(&mut self, surface: &Self::Surface, x: i32, y: i32) {
        self.calls.set_origin.push((surface.id, x, y));
    }

    fn set_size(&mut self, surface: &Self::Surface, width: i32, height: i32) {
        self.calls.set_size.push((surface.id, width, height));
    }

    fn set_title(&mut self, surface: &Self::Surface, title: &str) {
        self.calls.set_title.push((surface.id, title.to_owned()));
    }

    fn get_proc_address(&self, name: &CStr) -> *const c_void {
        match name.to_str() {
            Ok(name) if KNOWN_FUNCTIONS.contains(&name) => headless_gl_stub as *const c_void,
            _ => std::ptr::null(),
        }
    }
}
