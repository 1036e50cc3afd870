//! Environment-driven settings.
//!
//! ```bash
//! # Always record login and cwd, even for callers that restrict fields
//! PROCHIST_FORCE_FIELDS="login, cwd"
//!
//! # Store history packed once it exceeds 28000 bytes
//! PROCHIST_SIZE_LIMIT=28000
//! ```

/// Names automatic fields recorded regardless of the caller's selection.
pub const FORCE_FIELDS_ENV: &str = "PROCHIST_FORCE_FIELDS";
/// Byte limit above which stored history is packed.
pub const SIZE_LIMIT_ENV: &str = "PROCHIST_SIZE_LIMIT";

/// Settings read from the environment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Automatic fields forced into every record, in the configured order.
    pub force_fields: Vec<String>,
    /// Item size limit for stores opened with
    /// [`SidecarStore::open_with_config`](crate::store::SidecarStore::open_with_config).
    pub size_limit: Option<usize>,
}

impl HistoryConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let force_fields = lookup(FORCE_FIELDS_ENV)
            .map(|raw| parse_field_list(&raw))
            .unwrap_or_default();

        let size_limit = lookup(SIZE_LIMIT_ENV).and_then(|raw| match raw.trim().parse::<usize>() {
            Ok(0) => None,
            Ok(limit) => Some(limit),
            Err(_) => {
                tracing::warn!(value = %raw, "ignoring {SIZE_LIMIT_ENV}: not a byte count");
                None
            }
        });

        Self {
            force_fields,
            size_limit,
        }
    }
}

/// Split a field list on commas, semicolons or whitespace.
///
/// Order is kept and repeated names are dropped.
pub fn parse_field_list(raw: &str) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    for name in raw
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|s| !s.is_empty())
    {
        if !fields.iter().any(|f| f == name) {
            fields.push(name.to_string());
        }
    }
    fields
}
