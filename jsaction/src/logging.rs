//! Console logging that degrades to stdio when no browser is present.

use cfg_if::cfg_if;

/// Uses `println!()`-style formatting to log something to the console (in the
/// browser) or via `println!()` (if not in the browser).
#[macro_export]
macro_rules! log {
    ($($t:tt)*) => ($crate::logging::console_log(&format_args!($($t)*).to_string()))
}

/// Uses `println!()`-style formatting to log warnings to the console (in the
/// browser) or via `eprintln!()` (if not in the browser).
#[macro_export]
macro_rules! warn {
    ($($t:tt)*) => ($crate::logging::console_warn(&format_args!($($t)*).to_string()))
}

/// Uses `println!()`-style formatting to log errors to the console (in the
/// browser) or via `eprintln!()` (if not in the browser).
#[macro_export]
macro_rules! error {
    ($($t:tt)*) => ($crate::logging::console_error(&format_args!($($t)*).to_string()))
}

/// Like [`warn!`], but compiled out of release builds.
#[macro_export]
macro_rules! debug_warn {
    ($($x:tt)*) => {
        {
            #[cfg(debug_assertions)]
            {
                $crate::warn!($($x)*)
            }
            #[cfg(not(debug_assertions))]
            {
                if false {
                    $crate::warn!($($x)*)
                }
            }
        }
    }
}

/// Log a string to the console (in the browser) or via `println!()`.
pub fn console_log(s: &str) {
    cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            web_sys::console::log_1(&wasm_bindgen::JsValue::from_str(s));
        } else {
            println!("{s}");
        }
    }
}

/// Log a warning to the console (in the browser) or via `eprintln!()`.
pub fn console_warn(s: &str) {
    cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            web_sys::console::warn_1(&wasm_bindgen::JsValue::from_str(s));
        } else {
            eprintln!("{s}");
        }
    }
}

/// Log an error to the console (in the browser) or via `eprintln!()`.
pub fn console_error(s: &str) {
    cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            web_sys::console::error_1(&wasm_bindgen::JsValue::from_str(s));
        } else {
            eprintln!("{s}");
        }
    }
}
