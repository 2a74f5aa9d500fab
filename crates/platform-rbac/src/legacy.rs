//! # Legacy Codenames
//!
//! Deprecated codenames still stored on older roles. The table maps each
//! deprecated codename to its modern replacement, one direction only: holding
//! the deprecated codename satisfies a check for the modern one, never the
//! other way round.

/// Deprecated -> modern codename pairs.
const LEGACY_CODENAMES: &[(&str, &str)] = &[
    ("users.add", "users.create"),
    ("users.change", "users.edit"),
    ("users.remove", "users.delete"),
    ("roles.add", "roles.create"),
    ("roles.change", "roles.edit"),
    ("roles.remove", "roles.delete"),
    ("services.restart", "services.deploy"),
    ("services.manage", "services.edit"),
    ("settings.change", "settings.edit"),
    ("audit.read", "audit.view"),
    ("jobs.execute", "jobs.run"),
    ("files.add", "files.upload"),
];

/// Lookup over the deprecated codename table.
#[derive(Debug, Clone, Copy)]
pub struct LegacyCodenameMapper {
    table: &'static [(&'static str, &'static str)],
}

impl Default for LegacyCodenameMapper {
    fn default() -> Self {
        Self {
            table: LEGACY_CODENAMES,
        }
    }
}

impl LegacyCodenameMapper {
    /// Mapper over the built-in table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Modern replacement for a deprecated codename.
    pub fn modern_for(&self, deprecated: &str) -> Option<&'static str> {
        self.table
            .iter()
            .find(|(old, _)| *old == deprecated)
            .map(|(_, new)| *new)
    }

    /// Deprecated codenames that satisfy a check for `modern`.
    pub fn deprecated_for<'a>(&'a self, modern: &'a str) -> impl Iterator<Item = &'static str> + 'a {
        self.table
            .iter()
            .filter(move |(_, new)| *new == modern)
            .map(|(old, _)| *old)
    }

    /// Whether a codename is deprecated.
    pub fn is_deprecated(&self, codename: &str) -> bool {
        self.modern_for(codename).is_some()
    }
}
