use glutin_wgl_sys::wgl;
use glutin_wgl_sys::wgl::types::HGLRC;
use windows_sys::Win32::Graphics::Gdi::HDC;

use crate::error::{Error, ErrorKind, Result};

/// A guard for when you want to make the context current. Destroying the guard
/// restores the previously-current context.
#[derive(Debug)]
pub(crate) struct CurrentContextGuard {
    previous_hdc: wgl::types::HDC,
    previous_hglrc: HGLRC,
}

impl CurrentContextGuard {
    pub(crate) unsafe fn make_current(hdc: HDC, context: HGLRC) -> Result<Self> {
        unsafe {
            let previous_hdc = wgl::GetCurrentDC();
            let previous_hglrc = wgl::GetCurrentContext();

            if wgl::MakeCurrent(hdc as *const _, context) == 0 {
                return Err(Error::last_os_error(ErrorKind::BadAccess));
            }

            Ok(CurrentContextGuard { previous_hdc, previous_hglrc })
        }
    }
}

impl Drop for CurrentContextGuard {
    fn drop(&mut self) {
        unsafe {
            wgl::MakeCurrent(self.previous_hdc, self.previous_hglrc);
        }
    }
}
