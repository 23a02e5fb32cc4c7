//! FFI bindings for Vitalog
//!
//! This module provides C-compatible functions for calling Vitalog from a
//! presentation host. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using `vitalog_free_string`.
//!
//! Records are passed as a JSON array of objects, one per patient-day.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::NaiveDate;

use crate::config::EngineConfig;
use crate::encoder::ReportEncoder;
use crate::error::VitalsError;
use crate::pipeline::{infer_patient_id, PatientSession};
use crate::schema::{field::parse_date, RecordAdapter};
use crate::window::Period;

/// Patient identifier used when neither the caller nor the records supply one
const UNKNOWN_PATIENT: &str = "unknown";

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Optional arguments are NULL or a non-empty string
unsafe fn optional_arg(ptr: *const c_char) -> Option<String> {
    cstr_to_string(ptr).filter(|s| !s.trim().is_empty())
}

fn parse_period(raw: Option<String>) -> Result<Period, VitalsError> {
    match raw {
        Some(text) => text.parse().map_err(VitalsError::ParseError),
        None => Ok(Period::Week),
    }
}

fn parse_reference_date(raw: Option<String>) -> Result<Option<NaiveDate>, VitalsError> {
    match raw {
        Some(text) => parse_date(&text)
            .map(Some)
            .ok_or_else(|| VitalsError::DateParseError(format!("invalid reference date '{text}'"))),
        None => Ok(None),
    }
}

/// Parse the shared session arguments and run ingestion
unsafe fn open_session(
    records_json: *const c_char,
    patient_id: *const c_char,
    reference_date: *const c_char,
    period: *const c_char,
) -> Result<PatientSession, VitalsError> {
    let json = cstr_to_string(records_json)
        .ok_or_else(|| VitalsError::ParseError("Invalid records string pointer".to_string()))?;
    let records = RecordAdapter::parse_array(&json)?;

    let patient_id = optional_arg(patient_id)
        .or_else(|| infer_patient_id(&records))
        .unwrap_or_else(|| UNKNOWN_PATIENT.to_string());
    let records = RecordAdapter::select_patient(records, &patient_id);

    let reference_date = parse_reference_date(optional_arg(reference_date))?;
    let period = parse_period(optional_arg(period))?;

    PatientSession::from_records(
        &patient_id,
        &records,
        &EngineConfig::default(),
        reference_date,
        period,
    )
}

// ============================================================================
// Stateless API
// ============================================================================

/// Summarize one patient's records and return the report JSON.
///
/// # Safety
/// - `records_json` must be a valid null-terminated C string.
/// - `patient_id`, `reference_date` (YYYY-MM-DD) and `period` ("week" or
///   "month") may be NULL to use defaults.
/// - Returns a newly allocated string that must be freed with `vitalog_free_string`.
/// - Returns NULL on error; call `vitalog_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitalog_summarize(
    records_json: *const c_char,
    patient_id: *const c_char,
    reference_date: *const c_char,
    period: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let session = match open_session(records_json, patient_id, reference_date, period) {
        Ok(session) => session,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let report = session.report(&ReportEncoder::new());
    match serde_json::to_string(&report) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Session API
// ============================================================================

/// Opaque handle to a PatientSession
pub struct VitalogSessionHandle {
    session: PatientSession,
    encoder: ReportEncoder,
}

/// Ingest records and open a navigable session.
///
/// # Safety
/// - Same argument rules as `vitalog_summarize`.
/// - Returns a pointer that must be freed with `vitalog_session_free`.
/// - Returns NULL on error; call `vitalog_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitalog_session_new(
    records_json: *const c_char,
    patient_id: *const c_char,
    reference_date: *const c_char,
    period: *const c_char,
) -> *mut VitalogSessionHandle {
    clear_last_error();

    match open_session(records_json, patient_id, reference_date, period) {
        Ok(session) => Box::into_raw(Box::new(VitalogSessionHandle {
            session,
            encoder: ReportEncoder::new(),
        })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a session.
///
/// # Safety
/// - `session` must be a valid pointer returned by `vitalog_session_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn vitalog_session_free(session: *mut VitalogSessionHandle) {
    if !session.is_null() {
        drop(Box::from_raw(session));
    }
}

/// Step back one week or month. Returns 0 on success, -1 on a NULL handle.
///
/// # Safety
/// - `session` must be a valid pointer returned by `vitalog_session_new`.
#[no_mangle]
pub unsafe extern "C" fn vitalog_session_previous(session: *mut VitalogSessionHandle) -> i32 {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }

    (*session).session.go_to_previous();
    0
}

/// Step forward one week or month. Returns 0 on success, -1 on a NULL handle.
///
/// # Safety
/// - `session` must be a valid pointer returned by `vitalog_session_new`.
#[no_mangle]
pub unsafe extern "C" fn vitalog_session_next(session: *mut VitalogSessionHandle) -> i32 {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }

    (*session).session.go_to_next();
    0
}

/// Switch between "week" and "month". Returns 0 on success, non-zero on error.
///
/// # Safety
/// - `session` must be a valid pointer returned by `vitalog_session_new`.
/// - `period` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn vitalog_session_set_period(
    session: *mut VitalogSessionHandle,
    period: *const c_char,
) -> i32 {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }

    let period = match cstr_to_string(period).map(|p| p.parse::<Period>()) {
        Some(Ok(period)) => period,
        Some(Err(e)) => {
            set_last_error(&e);
            return -1;
        }
        None => {
            set_last_error("Invalid period string pointer");
            return -1;
        }
    };

    (*session).session.set_period(period);
    0
}

/// Report JSON for the session's current navigation state.
///
/// # Safety
/// - `session` must be a valid pointer returned by `vitalog_session_new`.
/// - Returns a newly allocated string that must be freed with `vitalog_free_string`.
/// - Returns NULL on error; call `vitalog_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitalog_session_summary(
    session: *const VitalogSessionHandle,
) -> *mut c_char {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return ptr::null_mut();
    }

    let handle = &*session;
    let report = handle.session.report(&handle.encoder);
    match serde_json::to_string(&report) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Vitalog functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Vitalog function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn vitalog_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Vitalog function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn vitalog_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Vitalog library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn vitalog_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
