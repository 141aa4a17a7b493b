//! Request correlation: request id plus a causally linked span handle.
//!
//! The span travels in the `Span-Context` metadata entry using the
//! `{trace-id}:{span-id}:{parent-span-id}:{flags}` hex encoding. Every
//! orchestration step derives a child span so remote calls and log lines
//! can be stitched back together.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use uuid::Uuid;

use crate::error::CoreError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const SPAN_CONTEXT_HEADER: &str = "span-context";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanContext {
    pub trace_id: u128,
    pub span_id: u64,
    pub parent_id: u64,
    pub flags: u8,
}

impl SpanContext {
    /// Start a new trace with no parent.
    pub fn new_root() -> Self {
        let mut rng = rand::rng();
        Self {
            trace_id: rng.random_range(1..=u128::MAX),
            span_id: rng.random_range(1..=u64::MAX),
            parent_id: 0,
            flags: 1,
        }
    }

    /// Derive a child span in the same trace.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id: rand::rng().random_range(1..=u64::MAX),
            parent_id: self.span_id,
            flags: self.flags,
        }
    }
}

impl fmt::Display for SpanContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:x}:{:x}:{:x}:{:x}",
            self.trace_id, self.span_id, self.parent_id, self.flags
        )
    }
}

impl FromStr for SpanContext {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::Unauthorized(format!("invalid span context '{s}'"));

        let tokens: Vec<&str> = s.split(':').collect();
        let [trace, span, parent, flags] = tokens.as_slice() else {
            return Err(invalid());
        };

        let trace_id = parse_hex(trace, 32, u128::from_str_radix).ok_or_else(invalid)?;
        let span_id = parse_hex(span, 16, u64::from_str_radix).ok_or_else(invalid)?;
        let parent_id = parse_hex(parent, 16, u64::from_str_radix).ok_or_else(invalid)?;
        let flags = parse_hex(flags, 2, u8::from_str_radix).ok_or_else(invalid)?;

        if trace_id == 0 || span_id == 0 {
            return Err(invalid());
        }

        Ok(Self {
            trace_id,
            span_id,
            parent_id,
            flags,
        })
    }
}

fn parse_hex<T>(
    token: &str,
    max_len: usize,
    parse: fn(&str, u32) -> Result<T, std::num::ParseIntError>,
) -> Option<T> {
    if token.is_empty() || token.len() > max_len {
        return None;
    }
    parse(token, 16).ok()
}

/// Correlation handle carried through every step of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceContext {
    pub request_id: Uuid,
    pub span: SpanContext,
}

impl TraceContext {
    /// Parse inbound call metadata. Both entries are required.
    pub fn from_metadata(
        request_id: Option<&str>,
        span_context: Option<&str>,
    ) -> Result<Self, CoreError> {
        let request_id = request_id
            .ok_or_else(|| CoreError::Unauthorized("missing X-Request-Id metadata".into()))?;
        let request_id = Uuid::parse_str(request_id).map_err(|_| {
            CoreError::Unauthorized(format!("X-Request-Id '{request_id}' is not a uuid"))
        })?;

        let span = span_context
            .ok_or_else(|| CoreError::Unauthorized("missing Span-Context metadata".into()))?
            .parse()?;

        Ok(Self { request_id, span })
    }

    /// Same request, child span.
    pub fn child(&self) -> Self {
        Self {
            request_id: self.request_id,
            span: self.span.child(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const REQUEST_ID: &str = "6f1c2a52-7d4b-4f1e-9d0a-2b6f6f0e8c11";

    #[test]
    fn span_context_round_trips_through_display() {
        let span: SpanContext = "a1b2c3:d4e5f6:0:1".parse().unwrap();
        assert_eq!(span.trace_id, 0xa1b2c3);
        assert_eq!(span.span_id, 0xd4e5f6);
        assert_eq!(span.parent_id, 0);
        assert_eq!(span.flags, 1);
        assert_eq!(span.to_string(), "a1b2c3:d4e5f6:0:1");
    }

    #[test]
    fn span_context_rejects_malformed_input() {
        for bad in [
            "",
            "a1b2c3:d4e5f6:0",
            "a1b2c3:d4e5f6:0:1:9",
            "xyz:d4e5f6:0:1",
            "0:d4e5f6:0:1",
            "a1b2c3:0:0:1",
            "a1b2c3:d4e5f6:0:100",
            "a1b2c3:11112222333344445:0:1",
        ] {
            assert_matches!(bad.parse::<SpanContext>(), Err(CoreError::Unauthorized(_)), "{bad}");
        }
    }

    #[test]
    fn child_keeps_trace_and_links_parent() {
        let root = SpanContext::new_root();
        let child = root.child();
        assert_eq!(child.trace_id, root.trace_id);
        assert_eq!(child.parent_id, root.span_id);
        assert_eq!(child.flags, root.flags);
    }

    #[test]
    fn metadata_requires_uuid_request_id() {
        assert_matches!(
            TraceContext::from_metadata(Some("not-a-uuid"), Some("a:b:0:1")),
            Err(CoreError::Unauthorized(_))
        );
        assert_matches!(
            TraceContext::from_metadata(None, Some("a:b:0:1")),
            Err(CoreError::Unauthorized(_))
        );
        assert_matches!(
            TraceContext::from_metadata(Some(REQUEST_ID), None),
            Err(CoreError::Unauthorized(_))
        );
    }

    #[test]
    fn metadata_parses_valid_pair() {
        let ctx = TraceContext::from_metadata(Some(REQUEST_ID), Some("a:b:0:1")).unwrap();
        assert_eq!(ctx.request_id.to_string(), REQUEST_ID);
        assert_eq!(ctx.span.span_id, 0xb);
    }
}
