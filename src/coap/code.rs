//! CoAP message codes with their exact numeric mapping.
//!
//! The numeric values follow RFC 7252 (`(class << 5) | detail`) and must be
//! preserved for wire compatibility with existing peers; the rest of the
//! crate only ever names the variants.

use std::fmt;

/// Message code carried in the CoAP header.
///
/// # Examples
///
/// ```
/// use blockwise::coap::Code;
/// assert_eq!(Code::Continue.raw(), 0x5F);
/// assert_eq!(Code::Continue.to_string(), "2.31");
/// assert!(Code::Get.is_request());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Code {
    /// 0.00, the empty message (ping or bare acknowledgement).
    Empty,
    /// 0.01
    Get,
    /// 0.02
    Post,
    /// 0.03
    Put,
    /// 0.04
    Delete,
    /// 2.01
    Created,
    /// 2.02
    Deleted,
    /// 2.04
    Changed,
    /// 2.05
    Content,
    /// 2.31, more block-1 fragments expected.
    Continue,
    /// 4.00
    BadRequest,
    /// 4.02
    BadOption,
    /// 4.04
    NotFound,
    /// 4.05
    MethodNotAllowed,
    /// 4.08, request entity incomplete (block sequencing failure).
    RequestEntityIncomplete,
    /// 4.12
    PreconditionFailed,
    /// 4.13, request entity too large.
    RequestEntityTooLarge,
    /// 5.00
    InternalServerError,
}

impl Code {
    /// Numeric header value, `(class << 5) | detail`.
    #[must_use]
    pub const fn raw(self) -> u8 {
        match self {
            Self::Empty => 0x00,
            Self::Get => 0x01,
            Self::Post => 0x02,
            Self::Put => 0x03,
            Self::Delete => 0x04,
            Self::Created => (2 << 5) | 1,
            Self::Deleted => (2 << 5) | 2,
            Self::Changed => (2 << 5) | 4,
            Self::Content => (2 << 5) | 5,
            Self::Continue => (2 << 5) | 31,
            Self::BadRequest => 4 << 5,
            Self::BadOption => (4 << 5) | 2,
            Self::NotFound => (4 << 5) | 4,
            Self::MethodNotAllowed => (4 << 5) | 5,
            Self::RequestEntityIncomplete => (4 << 5) | 8,
            Self::PreconditionFailed => (4 << 5) | 12,
            Self::RequestEntityTooLarge => (4 << 5) | 13,
            Self::InternalServerError => 5 << 5,
        }
    }

    /// Code class (the `c` in `c.dd`).
    #[must_use]
    pub const fn class(self) -> u8 { self.raw() >> 5 }

    /// Code detail (the `dd` in `c.dd`).
    #[must_use]
    pub const fn detail(self) -> u8 { self.raw() & 0x1F }

    /// Whether the code lies in the request range (GET..DELETE).
    #[must_use]
    pub const fn is_request(self) -> bool {
        matches!(self, Self::Get | Self::Post | Self::Put | Self::Delete)
    }

    /// Whether the code signals a client or server error (class 4 or 5).
    #[must_use]
    pub const fn is_error(self) -> bool { self.class() >= 4 }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.class(), self.detail())
    }
}
