use cfg_aliases::cfg_aliases;

fn main() {
    // Setup alias to reduce `cfg` boilerplate.
    cfg_aliases! {
        // Systems.
        macos_platform: { target_os = "macos" },
        free_unix: { all(unix, not(macos_platform), not(target_os = "ios"), not(target_os = "android")) },

        // Native windowing backends.
        x11_platform: { all(feature = "x11", free_unix) },
        win32_platform: { all(feature = "wgl", windows) },
        cocoa_platform: { macos_platform },
    }
}
