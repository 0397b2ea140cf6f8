//! HTTP status codes as a typed enum.
//!
//! Only the codes slate actually sends are listed. Use [`Status`] anywhere a
//! status code is accepted: `Response::status()`, `Response::builder().status()`,
//! or [`AccessLog::record`](crate::access_log::AccessLog::record).

/// The status codes a slate response can carry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                  // 200

    // ── 3xx Redirection ───────────────────────────────────────────────────────
    Found,               // 302

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,          // 400
    Unauthorized,        // 401
    NotFound,            // 404
    MethodNotAllowed,    // 405
    ContentTooLarge,     // 413

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError, // 500
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Self::Ok                  => 200,
            Self::Found               => 302,
            Self::BadRequest          => 400,
            Self::Unauthorized        => 401,
            Self::NotFound            => 404,
            Self::MethodNotAllowed    => 405,
            Self::ContentTooLarge     => 413,
            Self::InternalServerError => 500,
        }
    }
}
