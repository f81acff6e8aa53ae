use std::cell::RefCell;
use std::rc::Rc;

use wtk::event::{Button, ButtonMask, ElementState, Event, KeyCode, Modifiers, NativeEvent};
use wtk::platform::headless::HeadlessBackend;
use wtk::{Rect, WindowAttributes, WindowId, Wtk};

type Log = Rc<RefCell<Vec<Event>>>;

fn recording_window(wtk: &mut Wtk<HeadlessBackend>) -> (WindowId, Log) {
    let log = Log::default();
    let sink = log.clone();
    let attrs = WindowAttributes::new().with_callback(move |_, event| sink.borrow_mut().push(*event));
    (wtk.create_window(attrs).unwrap(), log)
}

fn motion(x: i32, y: i32) -> NativeEvent {
    NativeEvent::CursorMoved { x, y, buttons: ButtonMask::empty(), mods: Modifiers::empty() }
}

#[test]
fn close_request_is_reported_once_in_order() {
    let mut wtk = Wtk::new(HeadlessBackend::new());
    let (id, log) = recording_window(&mut wtk);

    wtk.backend_mut().push_event(id, NativeEvent::CloseRequested);
    wtk.backend_mut().push_event(id, NativeEvent::FocusOut);
    wtk.poll_events();

    assert_eq!(*log.borrow(), vec![Event::WindowClose, Event::WindowFocusOut]);
    assert!(wtk.window_should_close(id));

    // The window stays usable until it's deleted.
    assert!(wtk.swap_buffers(id).is_ok());
    assert_eq!(wtk.live_windows(), 1);
}

#[test]
fn close_request_can_be_cancelled_from_the_callback() {
    let mut wtk = Wtk::new(HeadlessBackend::new());
    let attrs = WindowAttributes::new().with_callback(|state, event| {
        if *event == Event::WindowClose {
            assert!(state.should_close());
            state.set_should_close(false);
        }
    });
    let id = wtk.create_window(attrs).unwrap();

    wtk.backend_mut().push_event(id, NativeEvent::CloseRequested);
    wtk.poll_events();

    assert!(!wtk.window_should_close(id));
}

#[test]
fn resize_is_visible_inside_the_callback() {
    let mut wtk = Wtk::new(HeadlessBackend::new());
    let seen = Rc::new(RefCell::new(None));
    let sink = seen.clone();
    let attrs = WindowAttributes::new().with_callback(move |state, event| {
        if let Event::WindowResize { .. } = event {
            *sink.borrow_mut() = Some(state.rect());
        }
    });
    let id = wtk.create_window(attrs).unwrap();

    wtk.backend_mut().push_event(id, NativeEvent::Moved { x: 12, y: 34 });
    wtk.backend_mut().push_event(id, NativeEvent::Resized { width: 800, height: 600 });
    wtk.poll_events();

    assert_eq!(*seen.borrow(), Some(Rect::new(12, 34, 800, 600)));
    assert_eq!(wtk.window_rect(id), Some(Rect::new(12, 34, 800, 600)));
}

#[test]
fn moves_are_not_reported() {
    let mut wtk = Wtk::new(HeadlessBackend::new());
    let (id, log) = recording_window(&mut wtk);

    wtk.backend_mut().push_event(id, NativeEvent::Moved { x: 1, y: 2 });
    wtk.poll_events();

    assert!(log.borrow().is_empty());
    assert_eq!(wtk.window_rect(id).map(|rect| (rect.x, rect.y)), Some((1, 2)));
}

#[test]
fn motion_deltas_are_tracked_per_window() {
    let mut wtk = Wtk::new(HeadlessBackend::new());
    let (a, log_a) = recording_window(&mut wtk);
    let (b, log_b) = recording_window(&mut wtk);

    wtk.backend_mut().push_event(a, motion(10, 10));
    wtk.backend_mut().push_event(b, motion(100, 100));
    wtk.backend_mut().push_event(a, motion(15, 12));
    wtk.poll_events();

    let deltas = |log: &Log| {
        log.borrow()
            .iter()
            .filter_map(|event| match *event {
                Event::MouseMotion { dx, dy, .. } => Some((dx, dy)),
                _ => None,
            })
            .collect::<Vec<_>>()
    };

    assert_eq!(deltas(&log_a), vec![(10, 10), (5, 2)]);
    assert_eq!(deltas(&log_b), vec![(100, 100)]);
}

#[test]
fn input_events_are_translated() {
    let mut wtk = Wtk::new(HeadlessBackend::new());
    let (id, log) = recording_window(&mut wtk);
    let mods = Modifiers::SHIFT | Modifiers::CTRL;

    let backend = wtk.backend_mut();
    backend.push_event(id, NativeEvent::CursorEntered);
    backend.push_event(id, NativeEvent::Button {
        state: ElementState::Pressed,
        button: Button::RIGHT,
        x: 3,
        y: 4,
        mods,
    });
    backend.push_event(id, NativeEvent::Scroll { dx: 0, dy: -1 });
    backend.push_event(id, NativeEvent::Key {
        state: ElementState::Released,
        keycode: KeyCode::ESCAPE,
        scancode: 9,
        mods,
        position: Some((7, 8)),
    });
    backend.push_event(id, NativeEvent::CursorLeft);
    wtk.poll_events();

    assert_eq!(*log.borrow(), vec![
        Event::MouseEnter,
        Event::MouseDown { button: Button::RIGHT, x: 3, y: 4, mods },
        Event::MouseScroll { dx: 0, dy: -1 },
        Event::KeyUp { keycode: KeyCode::ESCAPE, scancode: 9, mods },
        Event::MouseLeave,
    ]);
}

#[test]
fn events_of_deleted_windows_are_dropped() {
    let mut wtk = Wtk::new(HeadlessBackend::new());
    let (a, log_a) = recording_window(&mut wtk);
    let (b, log_b) = recording_window(&mut wtk);

    wtk.backend_mut().push_event(a, NativeEvent::FocusIn);
    wtk.backend_mut().push_event(b, NativeEvent::FocusIn);
    wtk.delete_window(a);
    wtk.poll_events();

    assert!(log_a.borrow().is_empty());
    assert_eq!(*log_b.borrow(), vec![Event::WindowFocusIn]);
}

#[test]
fn events_arriving_after_deletion_are_discarded() {
    let mut wtk = Wtk::new(HeadlessBackend::new());
    let (a, log_a) = recording_window(&mut wtk);
    let (b, log_b) = recording_window(&mut wtk);

    wtk.delete_window(a);
    wtk.backend_mut().push_event(a, NativeEvent::CloseRequested);
    wtk.backend_mut().push_event(a, motion(4, 4));
    wtk.poll_events();

    assert!(log_a.borrow().is_empty());
    assert!(log_b.borrow().is_empty());
    assert_eq!(wtk.backend().pending_events(), 0);
    assert!(!wtk.window_should_close(b));
    assert_eq!(wtk.live_windows(), 1);
}

#[test]
fn extreme_motion_does_not_overflow() {
    let mut wtk = Wtk::new(HeadlessBackend::new());
    let (id, log) = recording_window(&mut wtk);

    wtk.backend_mut().push_event(id, motion(1, 0));
    wtk.backend_mut().push_event(id, motion(i32::MIN, 0));
    wtk.poll_events();

    assert_eq!(log.borrow().len(), 2);
    assert!(matches!(log.borrow()[1], Event::MouseMotion { x: i32::MIN, dx: i32::MAX, .. }));
}

#[test]
fn polling_without_windows_does_nothing() {
    let mut wtk = Wtk::new(HeadlessBackend::new());
    wtk.poll_events();
    assert!(!wtk.is_bootstrapped());
    assert_eq!(wtk.backend().calls().init, 0);
}

#[test]
fn windows_without_callback_still_track_state() {
    let mut wtk = Wtk::new(HeadlessBackend::new());
    let id = wtk.create_window(WindowAttributes::new()).unwrap();

    wtk.backend_mut().push_event(id, NativeEvent::Resized { width: 320, height: 200 });
    wtk.backend_mut().push_event(id, NativeEvent::CloseRequested);
    wtk.poll_events();

    assert_eq!(wtk.backend().pending_events(), 0);
    assert_eq!(wtk.window_rect(id), Some(Rect::new(0, 0, 320, 200)));
    assert!(wtk.window_should_close(id));
}
