use crate::MappingError;
use std::{fmt, str::FromStr, time::Duration};
use time::OffsetDateTime;

/// CQL consistency levels.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Consistency {
    Any,
    One,
    Two,
    Three,
    Quorum,
    All,
    #[default]
    LocalQuorum,
    EachQuorum,
    Serial,
    LocalSerial,
    LocalOne,
}

impl Consistency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Consistency::Any => "ANY",
            Consistency::One => "ONE",
            Consistency::Two => "TWO",
            Consistency::Three => "THREE",
            Consistency::Quorum => "QUORUM",
            Consistency::All => "ALL",
            Consistency::LocalQuorum => "LOCAL_QUORUM",
            Consistency::EachQuorum => "EACH_QUORUM",
            Consistency::Serial => "SERIAL",
            Consistency::LocalSerial => "LOCAL_SERIAL",
            Consistency::LocalOne => "LOCAL_ONE",
        }
    }
}

impl fmt::Display for Consistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Consistency {
    type Err = MappingError;

    /// Accepts `LocalOne`, `local_one` and `LOCAL_ONE` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Ok(match normalized.as_str() {
            "any" => Consistency::Any,
            "one" => Consistency::One,
            "two" => Consistency::Two,
            "three" => Consistency::Three,
            "quorum" => Consistency::Quorum,
            "all" => Consistency::All,
            "localquorum" => Consistency::LocalQuorum,
            "eachquorum" => Consistency::EachQuorum,
            "serial" => Consistency::Serial,
            "localserial" => Consistency::LocalSerial,
            "localone" => Consistency::LocalOne,
            _ => {
                return Err(MappingError::invalid_argument(format!(
                    "Unknown consistency level `{s}`"
                )));
            }
        })
    }
}

/// Per call execution options, every unset field is taken from the environment.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct ExecOptions {
    pub consistency: Option<Consistency>,
    pub idempotent: Option<bool>,
    pub tracing: Option<bool>,
    pub page_size: Option<u32>,
    pub timeout: Option<Duration>,
    /// Write only: row expiration, ignored unless positive.
    pub ttl_seconds: Option<i32>,
    /// Write only: client provided write time (`USING TIMESTAMP`).
    pub using_timestamp: Option<OffsetDateTime>,
    /// Write only: conditional insert (`IF NOT EXISTS`).
    pub if_not_exists: bool,
}

/// Environment level options for one kind of request.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct RequestProfile {
    pub consistency: Option<Consistency>,
    pub idempotent: Option<bool>,
    pub tracing: Option<bool>,
    pub page_size: Option<u32>,
    pub timeout: Option<Duration>,
}

/// Environment level options of reads and writes.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct RequestDefaults {
    pub read: RequestProfile,
    pub write: RequestProfile,
}

/// Options applied to a statement, every field populated.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub consistency: Consistency,
    pub idempotent: bool,
    pub tracing: bool,
    pub page_size: u32,
    pub timeout: Duration,
    pub ttl_seconds: Option<i32>,
    pub using_timestamp: Option<OffsetDateTime>,
    pub if_not_exists: bool,
}

pub const WRITE_DEFAULTS: ResolvedOptions = ResolvedOptions {
    consistency: Consistency::LocalQuorum,
    idempotent: true,
    tracing: false,
    page_size: 5000,
    timeout: Duration::from_secs(12),
    ttl_seconds: None,
    using_timestamp: None,
    if_not_exists: false,
};

pub const READ_DEFAULTS: ResolvedOptions = WRITE_DEFAULTS;

impl Default for ResolvedOptions {
    fn default() -> Self {
        WRITE_DEFAULTS
    }
}

/// Merge field by field: per call, then profile, then `defaults`.
///
/// The write only fields come from `per_call` alone.
pub fn effective(
    per_call: Option<&ExecOptions>,
    profile: Option<&RequestProfile>,
    defaults: &ResolvedOptions,
) -> ResolvedOptions {
    macro_rules! pick {
        ($field:ident) => {
            per_call
                .and_then(|v| v.$field)
                .or_else(|| profile.and_then(|v| v.$field))
                .unwrap_or(defaults.$field)
        };
    }
    ResolvedOptions {
        consistency: pick!(consistency),
        idempotent: pick!(idempotent),
        tracing: pick!(tracing),
        page_size: pick!(page_size),
        timeout: pick!(timeout),
        ttl_seconds: per_call.and_then(|v| v.ttl_seconds),
        using_timestamp: per_call.and_then(|v| v.using_timestamp),
        if_not_exists: per_call.is_some_and(|v| v.if_not_exists),
    }
}

pub fn effective_write(per_call: Option<&ExecOptions>, defaults: &RequestDefaults) -> ResolvedOptions {
    effective(per_call, Some(&defaults.write), &WRITE_DEFAULTS)
}

pub fn effective_read(per_call: Option<&ExecOptions>, defaults: &RequestDefaults) -> ResolvedOptions {
    effective(per_call, Some(&defaults.read), &READ_DEFAULTS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consistency_names() {
        for name in ["LocalOne", "local_one", "LOCAL_ONE", "local-one"] {
            assert_eq!(name.parse::<Consistency>().unwrap(), Consistency::LocalOne);
        }
        assert_eq!(Consistency::EachQuorum.to_string(), "EACH_QUORUM");
        assert!("sometimes".parse::<Consistency>().is_err());
    }

    #[test]
    fn defaults_only() {
        assert_eq!(effective(None, None, &WRITE_DEFAULTS), WRITE_DEFAULTS);
        assert_eq!(
            effective_read(None, &RequestDefaults::default()),
            READ_DEFAULTS
        );
    }
}
