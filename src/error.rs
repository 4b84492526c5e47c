//! Machine-readable error codes shared by every error type in the crate.
//!
//! Each error enum keeps its human message in `Display` (via `thiserror`) and
//! reports a stable `E_*` code here, so front ends can branch on the code
//! without parsing messages.

pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
