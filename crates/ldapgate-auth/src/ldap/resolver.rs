//! Username to DN resolution

use super::directory::Directory;
use super::escape::{escape_filter_value, prepare_search_base};
use super::types::ResolvedName;
use ldapgate_core::{LdapConfig, Result};
use tracing::debug;

/// Search the configured bases, in order, for the entry matching `username`.
///
/// The first base that returns any entry decides the result: its first entry's
/// DN is used and the remaining bases are not searched. `Ok(None)` means no
/// base matched. Directory faults are returned as-is.
pub async fn resolve_user_dn(
    directory: &dyn Directory,
    config: &LdapConfig,
    username: &str,
) -> Result<Option<ResolvedName>> {
    let filter = config.build_user_filter(&escape_filter_value(username))?;

    for base in config.search_bases() {
        let base = prepare_search_base(base)?;
        debug!("Searching for user '{}' under '{}'", username, base);

        let entries = directory.search(base, &filter).await?;
        if let Some(dn) = entries.into_iter().next() {
            let name = ResolvedName::new(dn);
            debug!("Name in space for user '{}' is '{:?}'", username, name);
            return Ok(name);
        }
    }

    debug!("No entry found for user '{}'", username);
    Ok(None)
}
