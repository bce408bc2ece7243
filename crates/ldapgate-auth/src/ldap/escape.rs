//! Escaping for values placed into LDAP search requests

use ldapgate_core::{Error, Result};

/// Escape a value for inclusion in a search filter (RFC 4515).
///
/// An already escaped `\*` is first collapsed back to `*`, so a caller that
/// escaped the wildcard once does not end up matching a literal backslash.
/// Apply this to the username only, never to an assembled filter.
pub fn escape_filter_value(raw: &str) -> String {
    let normalized = raw.replace("\\*", "*");
    let mut escaped = String::with_capacity(normalized.len());

    for ch in normalized.chars() {
        match ch {
            '\\' => escaped.push_str("\\5c"),
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\0' => escaped.push_str("\\00"),
            _ => escaped.push(ch),
        }
    }

    escaped
}

/// Prepare a configured search base for the search request.
///
/// ldap3 puts the base on the wire as an LDAPDN octet string, so the DN's own
/// escaping is kept as written (`CN=Hello\,Ok`) and must not be decoded. Only
/// surrounding whitespace is dropped; NUL cannot be carried and is rejected.
pub fn prepare_search_base(base: &str) -> Result<&str> {
    let base = base.trim();
    if base.contains('\0') {
        return Err(Error::Directory(format!(
            "Invalid search base '{}': contains NUL",
            base.escape_debug()
        )));
    }
    Ok(base)
}
