use std::cell::RefCell;
use std::ffi::{c_void, CStr};
use std::rc::Rc;

use wtk::error::{ErrorKind, Result};
use wtk::event::NativeEvent;
use wtk::platform::headless::{HeadlessBackend, HeadlessSurface};
use wtk::{Backend, GlobalContext, WindowAttributes, WindowId, Wtk};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn backend_lives_as_long_as_windows() {
    init_logger();
    let mut wtk = Wtk::new(HeadlessBackend::new());
    assert!(!wtk.is_bootstrapped());

    let ids: Vec<_> =
        (0..4).map(|_| wtk.create_window(WindowAttributes::new()).unwrap()).collect();
    assert_eq!(wtk.live_windows(), 4);
    assert_eq!(wtk.backend().calls().init, 1);

    for &id in [ids[2], ids[0], ids[3]].iter() {
        wtk.delete_window(id);
        assert!(wtk.is_bootstrapped());
    }

    wtk.delete_window(ids[1]);
    assert_eq!(*wtk.global_context(), GlobalContext::default());
    assert_eq!(wtk.backend().calls().quit, 1);
    assert_eq!(wtk.backend().calls().destroyed, vec![ids[2], ids[0], ids[3], ids[1]]);
}

#[test]
fn backend_is_bootstrapped_again_after_teardown() {
    init_logger();
    let mut wtk = Wtk::new(HeadlessBackend::new());

    let id = wtk.create_window(WindowAttributes::new()).unwrap();
    wtk.delete_window(id);
    let id = wtk.create_window(WindowAttributes::new()).unwrap();

    assert_eq!(wtk.backend().calls().init, 2);
    assert_eq!(wtk.backend().calls().quit, 1);
    assert!(wtk.backend().is_initialized());
    wtk.delete_window(id);
}

#[test]
fn failed_bootstrap_can_be_retried() {
    init_logger();
    let mut wtk = Wtk::new(HeadlessBackend::new());
    wtk.backend_mut().fail_next_init(ErrorKind::NotFound);

    let err = wtk.create_window(WindowAttributes::new()).unwrap_err();
    assert_eq!(err.error_kind(), ErrorKind::NotFound);
    assert!(err.is_bootstrap_failure());
    assert!(!wtk.is_bootstrapped());
    assert_eq!(wtk.live_windows(), 0);

    let id = wtk.create_window(WindowAttributes::new()).unwrap();
    assert!(wtk.is_bootstrapped());
    assert!(!wtk.window_should_close(id));
}

#[test]
fn failed_creation_tears_down_the_backend() {
    init_logger();
    let mut wtk = Wtk::new(HeadlessBackend::new());
    wtk.backend_mut().fail_next_create(ErrorKind::BadConfig);

    let err = wtk.create_window(WindowAttributes::new()).unwrap_err();
    assert_eq!(err.error_kind(), ErrorKind::BadConfig);
    assert!(!wtk.is_bootstrapped());
    assert_eq!(wtk.backend().calls().init, 1);
    assert_eq!(wtk.backend().calls().quit, 1);
}

#[test]
fn failed_creation_keeps_other_windows() {
    init_logger();
    let mut wtk = Wtk::new(HeadlessBackend::new());
    let id = wtk.create_window(WindowAttributes::new()).unwrap();

    wtk.backend_mut().fail_next_create(ErrorKind::BadContext);
    assert!(wtk.create_window(WindowAttributes::new()).is_err());

    assert!(wtk.is_bootstrapped());
    assert_eq!(wtk.live_windows(), 1);
    assert!(!wtk.window_should_close(id));
}

#[test]
fn init_pins_the_backend() {
    init_logger();
    let mut wtk = Wtk::new(HeadlessBackend::new());
    wtk.init().unwrap();
    assert!(wtk.is_bootstrapped());
    assert!(wtk.raw_display_handle().is_none());

    let id = wtk.create_window(WindowAttributes::new()).unwrap();
    wtk.delete_window(id);
    assert!(wtk.is_bootstrapped());
    assert_eq!(wtk.backend().calls().init, 1);

    wtk.quit();
    assert!(!wtk.is_bootstrapped());
    assert_eq!(wtk.backend().calls().quit, 1);
}

#[test]
fn quit_waits_for_the_last_window() {
    init_logger();
    let mut wtk = Wtk::new(HeadlessBackend::new());
    wtk.init().unwrap();
    let id = wtk.create_window(WindowAttributes::new()).unwrap();

    wtk.quit();
    assert!(wtk.is_bootstrapped());

    wtk.delete_window(id);
    assert!(!wtk.is_bootstrapped());
}

#[test]
fn attributes_reach_the_window() {
    init_logger();
    let mut wtk = Wtk::new(HeadlessBackend::new());
    let attrs = WindowAttributes::new().with_title("triangle").with_position(20, 30).with_size(0, -1);
    let id = wtk.create_window(attrs).unwrap();

    let rect = wtk.window_rect(id).unwrap();
    assert_eq!((rect.x, rect.y), (20, 30));
    assert_eq!((rect.width, rect.height), (wtk::window::DEFAULT_WIDTH, wtk::window::DEFAULT_HEIGHT));
    assert_eq!(wtk.window_title(id), Some("triangle"));
}

#[test]
fn setters_update_the_window() {
    init_logger();
    let mut wtk = Wtk::new(HeadlessBackend::new());
    let id = wtk.create_window(WindowAttributes::new()).unwrap();

    wtk.set_window_origin(id, 5, 6);
    wtk.set_window_size(id, 800, 600);
    wtk.set_window_title(id, "renamed");

    let rect = wtk.window_rect(id).unwrap();
    assert_eq!(rect, wtk::Rect::new(5, 6, 800, 600));
    assert_eq!(wtk.window_title(id), Some("renamed"));

    let calls = wtk.backend().calls();
    assert_eq!(calls.set_origin, vec![(id, 5, 6)]);
    assert_eq!(calls.set_size, vec![(id, 800, 600)]);
    assert_eq!(calls.set_title, vec![(id, "renamed".to_owned())]);
}

#[test]
fn invalid_setter_arguments_are_ignored() {
    init_logger();
    let mut wtk = Wtk::new(HeadlessBackend::new());
    let id = wtk.create_window(WindowAttributes::new()).unwrap();

    wtk.set_window_size(id, -1, 100);
    wtk.set_window_origin(id, 10, -10);
    wtk.set_window_title(id, "a\0b");

    let calls = wtk.backend().calls();
    assert!(calls.set_size.is_empty());
    assert!(calls.set_origin.is_empty());
    assert!(calls.set_title.is_empty());
    assert_eq!(wtk.window_rect(id), Some(wtk::Rect::new(0, 0, 640, 480)));
}

#[test]
fn deleted_windows_are_closing() {
    init_logger();
    let mut wtk = Wtk::new(HeadlessBackend::new());
    let id = wtk.create_window(WindowAttributes::new()).unwrap();
    wtk.delete_window(id);

    assert!(wtk.window_should_close(id));
    assert!(wtk.swap_buffers(id).is_ok());
    assert!(wtk.backend().calls().swap_buffers.is_empty());
    assert_eq!(wtk.window_title(id), None);
    assert!(wtk.raw_window_handle(id).is_none());
}

#[test]
fn current_context_and_swaps_reach_the_backend() {
    init_logger();
    let mut wtk = Wtk::new(HeadlessBackend::new());
    let id = wtk.create_window(WindowAttributes::new()).unwrap();

    wtk.make_current(id).unwrap();
    wtk.swap_buffers(id).unwrap();
    wtk.swap_buffers(id).unwrap();

    assert_eq!(wtk.backend().calls().make_current, vec![id]);
    assert_eq!(wtk.backend().calls().swap_buffers, vec![id, id]);
}

/// Forwards to a headless backend and logs the lifecycle calls somewhere
/// that outlives the toolkit.
struct Logged {
    inner: HeadlessBackend,
    log: Rc<RefCell<Vec<String>>>,
}

impl Backend for Logged {
    type Surface = HeadlessSurface;

    fn init(&mut self) -> Result<()> {
        self.log.borrow_mut().push("init".into());
        self.inner.init()
    }

    fn quit(&mut self) {
        self.log.borrow_mut().push("quit".into());
        self.inner.quit();
    }

    fn create_window(
        &mut self,
        id: WindowId,
        attributes: &WindowAttributes,
    ) -> Result<Self::Surface> {
        self.log.borrow_mut().push(format!("create {}", attributes.title()));
        self.inner.create_window(id, attributes)
    }

    fn destroy_window(&mut self, surface: Self::Surface) {
        self.log.borrow_mut().push(format!("destroy {}", surface.title()));
        self.inner.destroy_window(surface);
    }

    fn poll_events(&mut self, sink: &mut dyn FnMut(WindowId, NativeEvent)) {
        self.inner.poll_events(sink);
    }

    fn make_current(&mut self, surface: &Self::Surface) -> Result<()> {
        self.inner.make_current(surface)
    }

    fn swap_buffers(&mut self, surface: &Self::Surface) -> Result<()> {
        self.inner.swap_buffers(surface)
    }

    fn set_origin(&mut self, surface: &Self::Surface, x: i32, y: i32) {
        self.inner.set_origin(surface, x, y);
    }

    fn set_size(&mut self, surface: &Self::Surface, width: i32, height: i32) {
        self.inner.set_size(surface, width, height);
    }

    fn set_title(&mut self, surface: &Self::Surface, title: &str) {
        self.inner.set_title(surface, title);
    }

    fn get_proc_address(&self, name: &CStr) -> *const c_void {
        self.inner.get_proc_address(name)
    }
}

#[test]
fn dropping_the_toolkit_tears_everything_down() {
    init_logger();
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut wtk = Wtk::new(Logged { inner: HeadlessBackend::new(), log: log.clone() });

    wtk.init().unwrap();
    wtk.create_window(WindowAttributes::new().with_title("a")).unwrap();
    wtk.create_window(WindowAttributes::new().with_title("b")).unwrap();
    drop(wtk);

    let log = log.borrow();
    assert_eq!(log.first().map(String::as_str), Some("init"));
    assert_eq!(log.last().map(String::as_str), Some("quit"));
    assert!(log.contains(&"destroy a".to_owned()));
    assert!(log.contains(&"destroy b".to_owned()));
    assert_eq!(log.iter().filter(|entry| *entry == "quit").count(), 1);
}
