//! Path and path group states, as reported in `raw format` listings.

use std::str::FromStr;

use serde::Serialize;
use strum::{Display, EnumIter, EnumString, FromRepr, IntoStaticStr};

use crate::context::Context;

/// State of one path. The string forms are multipathd's `%T` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[derive(Display, EnumString, IntoStaticStr, FromRepr, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum PathStatus {
    #[strum(serialize = "undef")]
    Unknown = 0,
    #[strum(serialize = "faulty")]
    Down    = 2,
    #[strum(serialize = "ready")]
    Up      = 3,
    #[strum(serialize = "shaky")]
    Shaky   = 4,
    #[strum(serialize = "ghost")]
    Ghost   = 5,
    #[strum(serialize = "i/o pending")]
    Pending = 6,
    #[strum(serialize = "i/o timeout")]
    Timeout = 7,
    #[strum(serialize = "delayed")]
    Delayed = 9,
}

/// State of a path group. The string forms are multipathd's `%t` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[derive(Display, EnumString, IntoStaticStr, FromRepr, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum PathGroupStatus {
    #[strum(serialize = "undef")]
    Unknown  = 0,
    #[strum(serialize = "active")]
    Active   = 1,
    #[strum(serialize = "disabled")]
    Disabled = 2,
    #[strum(serialize = "enabled")]
    Enabled  = 3,
}

/// Token for a raw path status value, `"Invalid argument"` when unknown.
pub fn path_status_str(status: u32) -> &'static str {
    PathStatus::from_repr(status)
        .map(<&'static str>::from)
        .unwrap_or("Invalid argument")
}

/// Token for a raw path group status value, `"Invalid argument"` when unknown.
pub fn path_group_status_str(status: u32) -> &'static str {
    PathGroupStatus::from_repr(status)
        .map(<&'static str>::from)
        .unwrap_or("Invalid argument")
}

/// Look up a wire token; unknown tokens map to `unknown` with a warning.
pub(crate) fn status_from_token<T: FromStr>(ctx: &Context, what: &str, token: &str, unknown: T) -> T {
    match T::from_str(token) {
        Ok(v) => v,
        Err(_) => {
            ctx_warn!(ctx, "Got unknown {}: '{}'", what, token);
            unknown
        }
    }
}

pub(crate) fn path_status_from_token(ctx: &Context, token: &str) -> PathStatus {
    status_from_token(ctx, "path_status_str", token, PathStatus::Unknown)
}

pub(crate) fn path_group_status_from_token(ctx: &Context, token: &str) -> PathGroupStatus {
    status_from_token(ctx, "pg_status_str", token, PathGroupStatus::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use strum::IntoEnumIterator;

    #[test]
    fn path_status_tokens_round_trip() {
        for s in ["undef", "ready", "faulty", "shaky", "ghost", "i/o pending", "i/o timeout", "delayed"] {
            assert_eq!(PathStatus::from_str(s).unwrap().to_string(), s);
        }
        for st in PathStatus::iter() {
            assert_eq!(path_status_str(st as u32), st.to_string());
        }
    }

    #[test]
    fn path_group_status_tokens_round_trip() {
        for s in ["undef", "active", "disabled", "enabled"] {
            assert_eq!(PathGroupStatus::from_str(s).unwrap().to_string(), s);
        }
        for st in PathGroupStatus::iter() {
            assert_eq!(path_group_status_str(st as u32), st.to_string());
        }
    }

    #[test]
    fn wire_values_map_to_variants() {
        assert_eq!(PathStatus::from_str("ready").unwrap(), PathStatus::Up);
        assert_eq!(PathStatus::from_str("faulty").unwrap(), PathStatus::Down);
        assert_eq!(PathStatus::from_str("i/o pending").unwrap(), PathStatus::Pending);
        assert_eq!(PathGroupStatus::from_str("active").unwrap(), PathGroupStatus::Active);
        assert_eq!(PathGroupStatus::from_str("undef").unwrap(), PathGroupStatus::Unknown);
    }

    #[test]
    fn out_of_range_is_invalid_argument() {
        assert_eq!(path_status_str(1), "Invalid argument");
        assert_eq!(path_status_str(8), "Invalid argument");
        assert_eq!(path_status_str(10), "Invalid argument");
        assert_eq!(path_group_status_str(4), "Invalid argument");
        assert_eq!(path_group_status_str(u32::MAX), "Invalid argument");
    }

    #[test]
    fn unknown_token_warns() {
        let mut ctx = Context::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        ctx.set_log_func(move |_, prio, _, args| sink.lock().unwrap().push((prio, args.to_string())));

        assert_eq!(path_status_from_token(&ctx, "bogus"), PathStatus::Unknown);
        assert_eq!(path_group_status_from_token(&ctx, "Active"), PathGroupStatus::Unknown);
        assert_eq!(path_status_from_token(&ctx, "ghost"), PathStatus::Ghost);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, crate::LogPriority::Warning);
        assert_eq!(seen[0].1, "Got unknown path_status_str: 'bogus'");
    }
}
