//! Shared response envelope types for API handlers.
//!
//! All API responses use the `{ "ok": true, "data": ... }` envelope.
//! Use [`DataResponse`] instead of ad-hoc `serde_json::json!` calls to
//! get compile-time type safety and consistent serialization. Error
//! responses carry `{ "ok": false, "error": ..., "code": ... }` and are
//! produced by `AppError`.

use serde::Serialize;

/// Standard `{ "ok": true, "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { ok: true, data }
    }
}
