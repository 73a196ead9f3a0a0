//! FFI interface for C++ interop
//!
//! Provides a C-compatible entry point that runs the page processor over
//! one fetched page. Rules and results cross the boundary as JSON.

use std::ffi::{c_char, CStr, CString};
use std::ptr;
use std::sync::Arc;

use crate::collaborators::{NoCaptcha, NoCookies};
use crate::model::Request;
use crate::page::Page;
use crate::processor::PageProcessor;
use crate::resolver::SelectorEvaluator;
use crate::store::InMemoryRuleStore;

/// Result struct returned to C++
/// Both pointers are owned by Rust and must be freed via free_page_result
#[repr(C)]
pub struct PageResultFFI {
    /// JSON-serialized PageResult (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if processing failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Process one fetched page against a JSON rule set.
///
/// # Arguments
/// * `rules_json` - JSON-serialized RuleSet (null-terminated)
/// * `url` - URL the page was fetched from (null-terminated)
/// * `body_ptr` - Pointer to the page body (UTF-8, not necessarily null-terminated)
/// * `body_len` - Length of the page body in bytes
///
/// # Returns
/// PageResultFFI with either json_ptr set (`{"fields": ..., "childRequests": [...]}`)
/// or error_ptr set (validation failure or extraction fault)
///
/// # Safety
/// - `rules_json` and `url` must be valid null-terminated C strings
/// - `body_ptr` must point to valid memory of at least `body_len` bytes
/// - Caller must free the result via `free_page_result`
#[no_mangle]
pub unsafe extern "C" fn process_page_ffi(
    rules_json: *const c_char,
    url: *const c_char,
    body_ptr: *const c_char,
    body_len: usize,
) -> PageResultFFI {
    let rules_str = match c_str(rules_json, "Rules JSON") {
        Ok(s) => s,
        Err(msg) => return make_error_result(&msg),
    };
    let url_str = match c_str(url, "URL") {
        Ok(s) => s,
        Err(msg) => return make_error_result(&msg),
    };

    // Parse body
    let body = if body_ptr.is_null() || body_len == 0 {
        String::new()
    } else {
        let slice = std::slice::from_raw_parts(body_ptr as *const u8, body_len);
        match std::str::from_utf8(slice) {
            Ok(s) => s.to_string(),
            Err(_) => return make_error_result("Invalid UTF-8 in page body"),
        }
    };

    let store = match InMemoryRuleStore::from_json(rules_str) {
        Ok(store) => store,
        Err(e) => return make_error_result(&format!("Failed to load rules: {}", e)),
    };

    let processor = PageProcessor::new(
        Arc::new(store),
        Arc::new(SelectorEvaluator),
        Arc::new(NoCaptcha),
        Arc::new(NoCookies),
    );
    let page = Page::new(Request::new(url_str), body);

    let result = match processor.process(&page) {
        Ok(result) => result,
        Err(e) => return make_error_result(&e.to_string()),
    };

    // Serialize result to JSON
    match serde_json::to_string(&result) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => PageResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

/// Free a PageResultFFI returned by process_page_ffi
///
/// # Safety
/// - `result` must have been returned by `process_page_ffi`
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_page_result(result: PageResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

unsafe fn c_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, String> {
    if ptr.is_null() {
        return Err(format!("{} is null", what));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| format!("Invalid UTF-8 in {}", what))
}

// Helper to create error result
fn make_error_result(msg: &str) -> PageResultFFI {
    let error_cstr = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    PageResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}
