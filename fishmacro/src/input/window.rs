pub const GAME_WINDOW_TITLE: &str = "Roblox";

/// Bring the window titled `title` to the foreground.
#[cfg(windows)]
pub fn focus_window(title: &str) -> bool {
	use windows::{
		core::PCWSTR,
		Win32::UI::WindowsAndMessaging::{FindWindowW, SetForegroundWindow},
	};

	let wide = title.encode_utf16().chain(std::iter::once(0)).collect::<Vec<u16>>();
	// SAFETY: `wide` is NUL-terminated and outlives the call.
	let hwnd = match unsafe { FindWindowW(PCWSTR::null(), PCWSTR(wide.as_ptr())) } {
		Ok(hwnd) => hwnd,
		Err(err) => {
			tracing::warn!(error = %err, title, "game window not found");
			return false;
		}
	};
	let focused = unsafe { SetForegroundWindow(hwnd) }.as_bool();
	if !focused {
		tracing::warn!(title, "failed to focus game window");
	}
	focused
}

/// Without a foreground API, report whether the window exists.
#[cfg(not(windows))]
pub fn focus_window(title: &str) -> bool {
	let found = xcap::Window::all()
		.map(|windows| windows.iter().any(|w| w.title().ok().as_deref() == Some(title)))
		.unwrap_or(false);
	if !found {
		tracing::warn!(title, "game window not found");
	}
	found
}
