//! LDAP username/password authentication for ldapgate

pub mod ldap;

pub use ldap::{
    authenticate, escape_filter_value, resolve_user_dn, AuthOutcome, BoundContext, Directory,
    LdapConnection, LdapDirectory, ResolvedName, ServiceScope,
};
