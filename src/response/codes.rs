//! Error codes the node puts in the `Error` field.

pub const SUCCESS: i64 = 0;
pub const SESSION_EXPIRED: i64 = 41001;
pub const SERVICE_CEILING: i64 = 41002;
pub const ILLEGAL_DATAFORMAT: i64 = 41003;
pub const INVALID_VERSION: i64 = 41004;
pub const INVALID_METHOD: i64 = 42001;
pub const INVALID_PARAMS: i64 = 42002;
pub const INVALID_TRANSACTION: i64 = 43001;
pub const INVALID_ASSET: i64 = 43002;
pub const INVALID_BLOCK: i64 = 43003;
pub const UNKNOWN_TRANSACTION: i64 = 44001;
pub const UNKNOWN_ASSET: i64 = 44002;
pub const UNKNOWN_BLOCK: i64 = 44003;
pub const UNKNOWN_CONTRACT: i64 = 44004;
pub const INTERNAL_ERROR: i64 = 45001;
pub const SMARTCODE_ERROR: i64 = 47001;

/// Codes meaning the looked-up object does not exist.
pub fn is_not_found(code: i64) -> bool {
    matches!(
        code,
        UNKNOWN_TRANSACTION | UNKNOWN_ASSET | UNKNOWN_BLOCK | UNKNOWN_CONTRACT
    )
}

pub fn describe_error_code(code: i64) -> &'static str {
    match code {
        SUCCESS => "SUCCESS",
        SESSION_EXPIRED => "SESSION EXPIRED",
        SERVICE_CEILING => "SERVICE CEILING",
        ILLEGAL_DATAFORMAT => "ILLEGAL DATAFORMAT",
        INVALID_VERSION => "INVALID VERSION",
        INVALID_METHOD => "INVALID METHOD",
        INVALID_PARAMS => "INVALID PARAMS",
        INVALID_TRANSACTION => "INVALID TRANSACTION",
        INVALID_ASSET => "INVALID ASSET",
        INVALID_BLOCK => "INVALID BLOCK",
        UNKNOWN_TRANSACTION => "UNKNOWN TRANSACTION",
        UNKNOWN_ASSET => "UNKNOWN ASSET",
        UNKNOWN_BLOCK => "UNKNOWN BLOCK",
        UNKNOWN_CONTRACT => "UNKNOWN CONTRACT",
        INTERNAL_ERROR => "INTERNAL ERROR",
        SMARTCODE_ERROR => "SMARTCODE EXEC ERROR",
        _ => "UNKNOWN ERROR",
    }
}
