//! Print the events of two windows until both are closed.

use std::ffi::c_void;
use std::mem;

use wtk::event::Event;
use wtk::platform::NativeBackend;
use wtk::{WindowAttributes, Wtk};

const GL_COLOR_BUFFER_BIT: u32 = 0x4000;

type ClearColor = unsafe extern "system" fn(f32, f32, f32, f32);
type Clear = unsafe extern "system" fn(u32);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut wtk = Wtk::new(NativeBackend::default());

    let mut windows = Vec::new();
    for (title, x) in [("first", 100), ("second", 800)] {
        let attrs = WindowAttributes::new()
            .with_title(title)
            .with_position(x, 100)
            .with_size(600, 400)
            .with_callback(move |state, event| {
                println!("{title}: {event:?}");
                if let Event::KeyDown { keycode, .. } = event {
                    if *keycode == wtk::event::KeyCode::ESCAPE {
                        state.set_should_close(true);
                    }
                }
            });
        windows.push(wtk.create_window(attrs)?);
    }

    // Load the two functions needed to clear the windows.
    wtk.make_current(windows[0])?;
    let clear_color = wtk.get_proc_address("glClearColor");
    let clear = wtk.get_proc_address("glClear");
    if clear_color.is_null() || clear.is_null() {
        return Err("glClear is not available".into());
    }
    let clear_color = unsafe { mem::transmute::<*const c_void, ClearColor>(clear_color) };
    let clear = unsafe { mem::transmute::<*const c_void, Clear>(clear) };

    while !windows.is_empty() {
        wtk.poll_events();

        windows.retain(|&id| {
            if wtk.window_should_close(id) {
                wtk.delete_window(id);
                return false;
            }
            true
        });

        for (i, &id) in windows.iter().enumerate() {
            wtk.make_current(id)?;
            unsafe {
                clear_color(0.1 * i as f32, 0.2, 0.3, 1.0);
                clear(GL_COLOR_BUFFER_BIT);
            }
            wtk.swap_buffers(id)?;
        }
    }

    Ok(())
}
