//! Splitting of `show ... raw format` replies.
//!
//! Replies are borrowed, never modified: every field handed out is a slice
//! of the reply, and records copy what they keep.

use crate::context::Context;
use crate::errcode::{DmmpError, Result};

pub(crate) const SHOW_RAW_DELIM: char = '|';

/// Non-empty lines of a reply, in order.
pub(crate) fn split_lines<'a>(ctx: &Context, reply: &'a str) -> Vec<&'a str> {
    reply
        .split('\n')
        .filter(|line| !line.is_empty())
        .inspect(|line| ctx_debug!(ctx, "Got item: '{}'", line))
        .collect()
}

/// All `|`-separated fields of a line, empty ones included so positions
/// stay stable.
pub(crate) fn split_fields(line: &str) -> Vec<&str> {
    line.split(SHOW_RAW_DELIM).collect()
}

/// A field that may legitimately be empty. Missing fields are a bug.
pub(crate) fn field<'a>(ctx: &Context, fields: &[&'a str], idx: usize, name: &str) -> Result<&'a str> {
    fields.get(idx).copied().ok_or_else(|| {
        ctx_error!(ctx, "BUG: Got NULL {}", name);
        DmmpError::Bug
    })
}

/// A field that must be present and non-empty.
pub(crate) fn required_field<'a>(ctx: &Context, fields: &[&'a str], idx: usize, name: &str) -> Result<&'a str> {
    let v = field(ctx, fields, idx, name)?;
    if v.is_empty() {
        ctx_error!(ctx, "BUG: Got empty {}", name);
        return Err(DmmpError::Bug);
    }
    Ok(v)
}

/// Base-10 unsigned 32-bit integer; signs, whitespace and overflow are
/// rejected.
pub(crate) fn str_to_u32(ctx: &Context, s: &str) -> Result<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        ctx_error!(ctx, "BUG: Got invalid string for uint32_t: '{}'", s);
        return Err(DmmpError::Bug);
    }
    s.parse::<u32>().map_err(|e| {
        ctx_error!(ctx, "BUG: Got invalid string for uint32_t: '{}', {}", s, e);
        DmmpError::Bug
    })
}
