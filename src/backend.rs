//! Backend selection and SQL dialect adaptation
//!
//! Every query in this crate is authored in one canonical style: `%s`
//! placeholders and a `to_timestamp(%s)` wrapper around epoch-second
//! parameters. The backend is picked once when the connection is opened and
//! carries the rewrite rules that turn canonical SQL into something each
//! driver accepts.

/// The storage backend behind a [`StoreConn`](crate::StoreConn).
///
/// Chosen once at connection time from the configured URL; all dialect
/// decisions (placeholder style, timestamp handling, autoincrement syntax)
/// hang off this value instead of being re-derived per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Embedded single-file store (SQLite).
    Sqlite,
    /// Client/server store (PostgreSQL).
    Postgres,
}

impl Backend {
    /// Determine the backend from a connection URL.
    ///
    /// Any URL containing the `postgres` marker selects the client/server
    /// backend; everything else is treated as an embedded file path.
    pub fn from_url(url: &str) -> Backend {
        if url.contains("postgres") {
            Backend::Postgres
        } else {
            Backend::Sqlite
        }
    }

    /// Rewrite a canonical query for this backend.
    ///
    /// - Postgres: each `%s` becomes the next numbered placeholder (`$1`,
    ///   `$2`, ...). The driver binds parameters by position either way, so
    ///   the numbering carries no semantic change.
    /// - SQLite: each `%s` becomes `?`, then the `to_timestamp(?)` wrapper is
    ///   stripped (epoch seconds are stored raw), then a
    ///   `DISTINCT ON (notes) notes` selection falls back to the plain
    ///   `notes` column. SQLite has no `DISTINCT ON`; the fallback drops the
    ///   distinct filter on that backend.
    pub fn adapt(&self, sql: &str) -> String {
        match self {
            Backend::Postgres => {
                let mut out = String::with_capacity(sql.len() + 8);
                let mut rest = sql;
                let mut n = 0u32;
                while let Some(idx) = rest.find("%s") {
                    out.push_str(&rest[..idx]);
                    n += 1;
                    out.push('$');
                    out.push_str(&n.to_string());
                    rest = &rest[idx + 2..];
                }
                out.push_str(rest);
                out
            }
            Backend::Sqlite => {
                let mut out = sql.replace("%s", "?");
                out = out.replace("to_timestamp(?)", "?");
                if out.contains("DISTINCT ON") {
                    out = out.replace("DISTINCT ON (notes) notes", "notes");
                }
                out
            }
        }
    }

    /// Autoincrement primary-key column syntax for this backend.
    pub fn autoincrement_primary_key(&self) -> &'static str {
        match self {
            Backend::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
            Backend::Postgres => "SERIAL PRIMARY KEY",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Sqlite => write!(f, "sqlite"),
            Backend::Postgres => write!(f, "postgres"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url() {
        assert_eq!(Backend::from_url("sqlite:///data/perfumes.db"), Backend::Sqlite);
        assert_eq!(Backend::from_url("data/perfumes.db"), Backend::Sqlite);
        assert_eq!(
            Backend::from_url("postgres://user:pw@localhost/catalog"),
            Backend::Postgres
        );
        assert_eq!(
            Backend::from_url("postgresql://localhost/catalog"),
            Backend::Postgres
        );
    }

    #[test]
    fn test_adapt_postgres_numbers_placeholders() {
        let sql = "INSERT INTO UserMessages (user_id, timestamp, message, status, notes) \
                   VALUES (%s, to_timestamp(%s), %s, %s, %s)";
        let adapted = Backend::Postgres.adapt(sql);
        assert_eq!(
            adapted,
            "INSERT INTO UserMessages (user_id, timestamp, message, status, notes) \
             VALUES ($1, to_timestamp($2), $3, $4, $5)"
        );
    }

    #[test]
    fn test_adapt_sqlite_strips_canonical_tokens() {
        let sql = "INSERT INTO UserMessages (user_id, timestamp) VALUES (%s, to_timestamp(%s))";
        let adapted = Backend::Sqlite.adapt(sql);
        assert_eq!(
            adapted,
            "INSERT INTO UserMessages (user_id, timestamp) VALUES (?, ?)"
        );
        assert!(!adapted.contains("%s"));
        assert!(!adapted.contains("to_timestamp"));
    }

    #[test]
    fn test_adapt_sqlite_rewrites_distinct_on() {
        let sql = "SELECT DISTINCT ON (notes) notes FROM UserMessages WHERE user_id = %s";
        let adapted = Backend::Sqlite.adapt(sql);
        assert_eq!(adapted, "SELECT notes FROM UserMessages WHERE user_id = ?");

        // Postgres keeps the distinct filter.
        let adapted = Backend::Postgres.adapt(sql);
        assert_eq!(
            adapted,
            "SELECT DISTINCT ON (notes) notes FROM UserMessages WHERE user_id = $1"
        );
    }

    #[test]
    fn test_adapt_leaves_like_patterns_alone() {
        let sql = "SELECT notes FROM UserMessages WHERE notes LIKE 'Found: %' AND user_id = %s";
        let adapted = Backend::Sqlite.adapt(sql);
        assert_eq!(
            adapted,
            "SELECT notes FROM UserMessages WHERE notes LIKE 'Found: %' AND user_id = ?"
        );
    }

    #[test]
    fn test_autoincrement_primary_key() {
        assert_eq!(
            Backend::Sqlite.autoincrement_primary_key(),
            "INTEGER PRIMARY KEY AUTOINCREMENT"
        );
        assert_eq!(Backend::Postgres.autoincrement_primary_key(), "SERIAL PRIMARY KEY");
    }
}
