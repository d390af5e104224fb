//! Table-scoped query building.
//!
//! Application code names fields in camelCase; the schema uses snake_case.
//! Each entity declares an explicit [`FieldMap`] between the two, checked
//! once when its storage is constructed, and [`TableScope`] builds SQL
//! through that map so an unknown field fails instead of reaching the
//! database.

use crate::{StorageError, StorageResult};

// =============================================================================
// Field Map
// =============================================================================

/// Bidirectional `field <-> column` mapping for one entity.
#[derive(Debug)]
pub struct FieldMap {
    entity: &'static str,
    pairs: &'static [(&'static str, &'static str)],
}

impl FieldMap {
    /// Declares a mapping of `(field, column)` pairs.
    #[must_use]
    pub const fn new(entity: &'static str, pairs: &'static [(&'static str, &'static str)]) -> Self {
        Self { entity, pairs }
    }

    /// Returns the entity this map describes.
    #[must_use]
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    /// Translates an application field name to its column.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` for an unmapped field.
    pub fn column(&self, field: &str) -> StorageResult<&'static str> {
        self.pairs
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, c)| *c)
            .ok_or_else(|| {
                StorageError::invalid_input(format!("Unknown {} field: {}", self.entity, field))
            })
    }

    /// Translates a column back to its application field name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` for an unmapped column.
    pub fn field(&self, column: &str) -> StorageResult<&'static str> {
        self.pairs
            .iter()
            .find(|(_, c)| *c == column)
            .map(|(f, _)| *f)
            .ok_or_else(|| {
                StorageError::invalid_input(format!("Unknown {} column: {}", self.entity, column))
            })
    }

    /// Translates a list of fields to columns.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` on the first unmapped field.
    pub fn columns(&self, fields: &[&str]) -> StorageResult<Vec<&'static str>> {
        fields.iter().map(|f| self.column(f)).collect()
    }

    /// Checks the mapping is a bijection onto snake_case columns.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` describing the first problem found.
    pub fn validate(&self) -> StorageResult<()> {
        for (i, (field, column)) in self.pairs.iter().enumerate() {
            if !is_snake_case(column) {
                return Err(StorageError::invalid_input(format!(
                    "{} column `{}` is not snake_case",
                    self.entity, column
                )));
            }
            if to_snake_case(field) != *column {
                return Err(StorageError::invalid_input(format!(
                    "{} field `{}` does not correspond to column `{}`",
                    self.entity, field, column
                )));
            }
            let rest = &self.pairs[i + 1..];
            if rest.iter().any(|(f, c)| f == field || c == column) {
                return Err(StorageError::invalid_input(format!(
                    "{} mapping for `{}` is not one-to-one",
                    self.entity, field
                )));
            }
        }
        Ok(())
    }
}

fn is_snake_case(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('_')
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Converts `camelCase` to `snake_case`.
#[must_use]
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;
    for c in s.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

/// Derives a table name from a type name.
///
/// Every uppercase letter starts a new segment: `OAuthClient` becomes
/// `o_auth_client`. Multi-word tables are better named explicitly.
#[must_use]
pub fn table_name_for(type_name: &str) -> String {
    let mut out = String::with_capacity(type_name.len() + 4);
    for c in type_name.chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

// =============================================================================
// Table Scope
// =============================================================================

/// Query builder restricted to one table.
#[derive(Debug, Clone, Copy)]
pub struct TableScope {
    table: &'static str,
    fields: &'static FieldMap,
}

impl TableScope {
    /// Creates a scope after validating the field map.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` if the field map is invalid.
    pub fn new(table: &'static str, fields: &'static FieldMap) -> StorageResult<Self> {
        fields.validate()?;
        Ok(Self { table, fields })
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Returns the field map.
    #[must_use]
    pub fn fields(&self) -> &'static FieldMap {
        self.fields
    }

    fn quoted(&self) -> String {
        format!("\"{}\"", self.table)
    }

    /// `SELECT <fields> FROM <table> WHERE <f1> = $1 AND ...`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` for an unmapped field.
    pub fn select(&self, fields: &[&str], filters: &[&str]) -> StorageResult<String> {
        let columns = self.fields.columns(fields)?.join(", ");
        let mut sql = format!("SELECT {} FROM {}", columns, self.quoted());
        sql.push_str(&self.where_clause(filters, 1)?);
        Ok(sql)
    }

    /// `INSERT INTO <table> (<fields>) VALUES ($1, ...) RETURNING <returning>`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` for an unmapped field.
    pub fn insert(&self, fields: &[&str], returning: &[&str]) -> StorageResult<String> {
        let columns = self.fields.columns(fields)?;
        let placeholders = (1..=columns.len())
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.quoted(),
            columns.join(", "),
            placeholders
        );
        if !returning.is_empty() {
            sql.push_str(" RETURNING ");
            sql.push_str(&self.fields.columns(returning)?.join(", "));
        }
        Ok(sql)
    }

    /// Deletes at most one row matching `filter = $1`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` for an unmapped field.
    pub fn delete_one(&self, filter: &str) -> StorageResult<String> {
        let id = self.fields.column("id")?;
        let column = self.fields.column(filter)?;
        let table = self.quoted();
        Ok(format!(
            "DELETE FROM {table} WHERE {id} IN (SELECT {id} FROM {table} WHERE {column} = $1 LIMIT 1)"
        ))
    }

    fn where_clause(&self, filters: &[&str], first: usize) -> StorageResult<String> {
        if filters.is_empty() {
            return Ok(String::new());
        }
        let predicates = self
            .fields
            .columns(filters)?
            .into_iter()
            .enumerate()
            .map(|(i, c)| format!("{} = ${}", c, first + i))
            .collect::<Vec<_>>()
            .join(" AND ");
        Ok(format!(" WHERE {predicates}"))
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Offset/limit window. Not stable under concurrent inserts or deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    per_page: i64,
    current_page: i64,
}

impl Pagination {
    /// Creates a window; both arguments are clamped to at least 1.
    #[must_use]
    pub fn new(per_page: i64, current_page: i64) -> Self {
        Self {
            per_page: per_page.max(1),
            current_page: current_page.max(1),
        }
    }

    /// Rows per page.
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.per_page
    }

    /// Rows skipped before this page. Saturates at `i64::MAX`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.current_page - 1).saturating_mul(self.per_page)
    }

    /// One-based page number.
    #[must_use]
    pub fn current_page(&self) -> i64 {
        self.current_page
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(10, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TOKENS: FieldMap = FieldMap::new(
        "token",
        &[
            ("id", "id"),
            ("accessToken", "access_token"),
            ("refreshToken", "refresh_token"),
            ("clientId", "client_id"),
        ],
    );

    static DUPLICATED: FieldMap =
        FieldMap::new("broken", &[("id", "id"), ("userId", "user_id"), ("user", "user_id")]);

    static MISMATCHED: FieldMap = FieldMap::new("broken", &[("clientId", "client")]);

    #[test]
    fn test_paginate_clamps_page() {
        assert_eq!(Pagination::new(10, 0), Pagination::new(10, 1));
        assert_eq!(Pagination::new(10, 0).offset(), 0);
        assert_eq!(Pagination::new(10, -3).limit(), 10);
        assert_eq!(Pagination::new(10, 3).offset(), 20);
        assert_eq!(Pagination::new(0, 2).limit(), 1);
    }

    #[test]
    fn test_paginate_offset_saturates() {
        assert_eq!(Pagination::new(i64::MAX, 3).offset(), i64::MAX);
        assert_eq!(Pagination::new(2, i64::MAX).offset(), i64::MAX);
        assert_eq!(Pagination::new(i64::MAX, 1).offset(), 0);
    }

    #[test]
    fn test_case_conversion() {
        assert_eq!(to_snake_case("accessTokenExpiresAt"), "access_token_expires_at");
        assert_eq!(to_snake_case("id"), "id");
        assert_eq!(table_name_for("User"), "user");
        assert_eq!(table_name_for("OAuthClient"), "o_auth_client");
        assert_eq!(table_name_for("OAuth2"), "o_auth2");
    }

    #[test]
    fn test_field_map_translation() {
        assert_eq!(TOKENS.column("accessToken").unwrap(), "access_token");
        assert_eq!(TOKENS.field("client_id").unwrap(), "clientId");

        let err = TOKENS.column("access_token").unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_field_map_validation() {
        assert!(TOKENS.validate().is_ok());
        assert!(DUPLICATED.validate().is_err());
        assert!(MISMATCHED.validate().is_err());
        assert!(TableScope::new("broken", &MISMATCHED).is_err());
    }

    #[test]
    fn test_select_sql() {
        let scope = TableScope::new("oauth_token", &TOKENS).unwrap();
        assert_eq!(
            scope.select(&["id", "clientId"], &["accessToken"]).unwrap(),
            "SELECT id, client_id FROM \"oauth_token\" WHERE access_token = $1"
        );
        assert_eq!(
            scope.select(&["id"], &[]).unwrap(),
            "SELECT id FROM \"oauth_token\""
        );
        assert!(scope.select(&["secret"], &[]).is_err());
    }

    #[test]
    fn test_insert_sql() {
        let scope = TableScope::new("oauth_token", &TOKENS).unwrap();
        assert_eq!(
            scope
                .insert(&["accessToken", "clientId"], &["id"])
                .unwrap(),
            "INSERT INTO \"oauth_token\" (access_token, client_id) VALUES ($1, $2) RETURNING id"
        );
    }

    #[test]
    fn test_delete_one_sql() {
        let scope = TableScope::new("oauth_token", &TOKENS).unwrap();
        assert_eq!(
            scope.delete_one("refreshToken").unwrap(),
            "DELETE FROM \"oauth_token\" WHERE id IN \
             (SELECT id FROM \"oauth_token\" WHERE refresh_token = $1 LIMIT 1)"
        );
    }
}
