//! 浏览器环境辅助函数。

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
pub fn set_panic_hook() {}

pub fn console_log(message: &str) {
    web_sys::console::log_1(&message.into());
}
