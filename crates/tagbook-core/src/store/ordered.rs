//! Generic owner-scoped, soft-deletable, explicitly ordered collection.
//!
//! Groups and items share the same shape: every row belongs to one owner
//! (`uid`), carries a `deleted` flag and a `display_order`, and is referenced
//! by some dependent table that must be empty before the row may be deleted.
//! [`OrderedEntity`] captures the per-table differences; the free functions
//! below are the operations written once against it.

use std::ops::RangeInclusive;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::error::CoreError;
use crate::types::DisplayOrderChange;

use super::guard::{ensure_not_referenced, ensure_owner_unreferenced};

/// The table and column holding references to an entity.
#[derive(Debug, Clone, Copy)]
pub struct Dependent {
    pub table: &'static str,
    pub column: &'static str,
}

pub trait OrderedEntity: Sized {
    const TABLE: &'static str;
    const ID_COLUMN: &'static str;
    /// Column list in the order `from_row` reads it.
    const COLUMNS: &'static str;
    /// Column narrowing the ordering scope below the owner, if any.
    const SCOPE_COLUMN: Option<&'static str>;
    const DEPENDENT: Dependent;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
    fn insert(&self, conn: &Connection) -> Result<(), CoreError>;

    fn id(&self) -> i64;
    /// Value of `SCOPE_COLUMN` for this row, 0 when unscoped.
    fn scope_key(&self) -> i64;
    fn display_order(&self) -> i32;
    fn name(&self) -> &str;

    fn invalid_id(id: i64) -> CoreError;
    fn not_found(id: i64) -> CoreError;
    fn in_use(id: i64) -> CoreError;
    fn all_in_use() -> CoreError;
}

/// A column that `update_fields` may overwrite. `deleted` and `created_at`
/// are deliberately absent.
#[derive(Debug, Clone, Copy)]
pub enum Field<'a> {
    Name(&'a str),
    GroupId(i64),
    DisplayOrder(i32),
    Hidden(bool),
}

impl Field<'_> {
    fn column(&self) -> &'static str {
        match self {
            Field::Name(_) => "name",
            Field::GroupId(_) => "group_id",
            Field::DisplayOrder(_) => "display_order",
            Field::Hidden(_) => "hidden",
        }
    }

    fn value(&self) -> Value {
        match *self {
            Field::Name(name) => Value::Text(name.to_string()),
            Field::GroupId(id) => Value::Integer(id),
            Field::DisplayOrder(order) => Value::Integer(i64::from(order)),
            Field::Hidden(hidden) => Value::Integer(i64::from(hidden)),
        }
    }
}

/// Ids or names bound per `IN (...)` statement. Longer lists are split so a
/// query stays well below SQLite's bound-variable limit.
pub(crate) const IN_CHUNK_SIZE: usize = 1000;

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn check_ids<E: OrderedEntity>(ids: &[i64]) -> Result<(), CoreError> {
    match ids.iter().find(|&&id| id <= 0) {
        Some(&id) => Err(E::invalid_id(id)),
        None => Ok(()),
    }
}

// ==============================================================================
// Reads
// ==============================================================================

/// Every live row of `uid`, in storage order. Callers sort for display.
pub fn list<E: OrderedEntity>(conn: &Connection, uid: i64) -> Result<Vec<E>, CoreError> {
    let sql = format!(
        "SELECT {} FROM {} WHERE uid = ?1 AND deleted = 0",
        E::COLUMNS,
        E::TABLE
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![uid], E::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get<E: OrderedEntity>(conn: &Connection, uid: i64, id: i64) -> Result<E, CoreError> {
    if id <= 0 {
        return Err(E::invalid_id(id));
    }
    let sql = format!(
        "SELECT {} FROM {} WHERE uid = ?1 AND deleted = 0 AND {} = ?2",
        E::COLUMNS,
        E::TABLE,
        E::ID_COLUMN
    );
    conn.query_row(&sql, params![uid, id], E::from_row)
        .optional()?
        .ok_or_else(|| E::not_found(id))
}

/// Live rows of `uid` whose id is in `ids`. Unknown ids are simply absent.
pub fn get_many<E: OrderedEntity>(
    conn: &Connection,
    uid: i64,
    ids: &[i64],
) -> Result<Vec<E>, CoreError> {
    check_ids::<E>(ids)?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut rows = Vec::new();
    for chunk in ids.chunks(IN_CHUNK_SIZE) {
        let sql = format!(
            "SELECT {} FROM {} WHERE uid = ? AND deleted = 0 AND {} IN ({})",
            E::COLUMNS,
            E::TABLE,
            E::ID_COLUMN,
            placeholders(chunk.len())
        );
        let values =
            std::iter::once(Value::Integer(uid)).chain(chunk.iter().map(|&id| Value::Integer(id)));
        let mut stmt = conn.prepare(&sql)?;
        for row in stmt.query_map(params_from_iter(values), E::from_row)? {
            rows.push(row?);
        }
    }
    Ok(rows)
}

/// Highest live `display_order` in the scope, or 0 when the scope is empty.
/// `scope` is ignored for entities without a scope column.
pub fn max_display_order<E: OrderedEntity>(
    conn: &Connection,
    uid: i64,
    scope: i64,
) -> Result<i32, CoreError> {
    let max: i32 = match E::SCOPE_COLUMN {
        Some(column) => conn.query_row(
            &format!(
                "SELECT COALESCE(MAX(display_order), 0) FROM {} \
                 WHERE uid = ?1 AND deleted = 0 AND {column} = ?2",
                E::TABLE
            ),
            params![uid, scope],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            &format!(
                "SELECT COALESCE(MAX(display_order), 0) FROM {} WHERE uid = ?1 AND deleted = 0",
                E::TABLE
            ),
            params![uid],
            |row| row.get(0),
        )?,
    };
    Ok(max)
}

/// The `count` consecutive display orders following the scope's current
/// maximum. Fails when they would run past `i32::MAX`.
pub fn next_display_orders<E: OrderedEntity>(
    conn: &Connection,
    uid: i64,
    scope: i64,
    count: usize,
) -> Result<RangeInclusive<i32>, CoreError> {
    let max = max_display_order::<E>(conn, uid, scope)?;
    let last = i32::try_from(count.max(1))
        .ok()
        .and_then(|count| max.checked_add(count))
        .ok_or(CoreError::DisplayOrderExhausted { max })?;
    Ok(max + 1..=last)
}

pub fn name_exists<E: OrderedEntity>(
    conn: &Connection,
    uid: i64,
    name: &str,
) -> Result<bool, CoreError> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE uid = ?1 AND deleted = 0 AND name = ?2)",
        E::TABLE
    );
    Ok(conn.query_row(&sql, params![uid, name], |row| row.get(0))?)
}

/// Live rows of `uid` whose name is any of `names`, in one query.
pub fn find_by_names<E: OrderedEntity>(
    conn: &Connection,
    uid: i64,
    names: &[String],
) -> Result<Vec<E>, CoreError> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let mut rows = Vec::new();
    for chunk in names.chunks(IN_CHUNK_SIZE) {
        let sql = format!(
            "SELECT {} FROM {} WHERE uid = ? AND deleted = 0 AND name IN ({})",
            E::COLUMNS,
            E::TABLE,
            placeholders(chunk.len())
        );
        let values = std::iter::once(Value::Integer(uid))
            .chain(chunk.iter().map(|name| Value::Text(name.clone())));
        let mut stmt = conn.prepare(&sql)?;
        for row in stmt.query_map(params_from_iter(values), E::from_row)? {
            rows.push(row?);
        }
    }
    Ok(rows)
}

// ==============================================================================
// Writes
// ==============================================================================

/// Overwrite `fields` (plus `updated_at`) on the live rows of `uid` listed in
/// `ids`. Returns the number of rows touched.
pub fn update_fields<E: OrderedEntity>(
    conn: &Connection,
    uid: i64,
    ids: &[i64],
    fields: &[Field<'_>],
    now: i64,
) -> Result<usize, CoreError> {
    check_ids::<E>(ids)?;
    if ids.is_empty() {
        return Ok(0);
    }

    let mut assignments: Vec<String> = fields
        .iter()
        .map(|field| format!("{} = ?", field.column()))
        .collect();
    assignments.push("updated_at = ?".to_string());

    let assignments = assignments.join(", ");

    let mut updated = 0;
    for chunk in ids.chunks(IN_CHUNK_SIZE) {
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE uid = ? AND deleted = 0 AND {} IN ({})",
            E::TABLE,
            E::ID_COLUMN,
            placeholders(chunk.len())
        );
        let values = fields
            .iter()
            .map(Field::value)
            .chain([Value::Integer(now), Value::Integer(uid)])
            .chain(chunk.iter().map(|&id| Value::Integer(id)));
        updated += conn.execute(&sql, params_from_iter(values))?;
    }
    Ok(updated)
}

/// Apply each `(id, display_order)` pair as its own single-row update. The
/// first id that matches no live row of `uid` fails the call; the caller's
/// transaction then discards the pairs already applied.
pub fn reorder<E: OrderedEntity>(
    conn: &Connection,
    uid: i64,
    changes: &[DisplayOrderChange],
    now: i64,
) -> Result<(), CoreError> {
    for change in changes {
        let updated = update_fields::<E>(
            conn,
            uid,
            &[change.id],
            &[Field::DisplayOrder(change.display_order)],
            now,
        )?;
        if updated == 0 {
            return Err(E::not_found(change.id));
        }
    }
    Ok(())
}

pub fn soft_delete<E: OrderedEntity>(
    conn: &Connection,
    uid: i64,
    id: i64,
    now: i64,
) -> Result<(), CoreError> {
    if id <= 0 {
        return Err(E::invalid_id(id));
    }
    ensure_not_referenced::<E>(conn, uid, id)?;

    let sql = format!(
        "UPDATE {} SET deleted = 1, deleted_at = ?1, updated_at = ?1 \
         WHERE uid = ?2 AND deleted = 0 AND {} = ?3",
        E::TABLE,
        E::ID_COLUMN
    );
    if conn.execute(&sql, params![now, uid, id])? == 0 {
        return Err(E::not_found(id));
    }
    Ok(())
}

/// Soft-delete every live row of `uid`, refusing if any dependent row of the
/// owner still references one of them. Returns the number of rows deleted.
pub fn delete_all<E: OrderedEntity>(
    conn: &Connection,
    uid: i64,
    now: i64,
) -> Result<usize, CoreError> {
    ensure_owner_unreferenced::<E>(conn, uid)?;

    let sql = format!(
        "UPDATE {} SET deleted = 1, deleted_at = ?1, updated_at = ?1 WHERE uid = ?2 AND deleted = 0",
        E::TABLE
    );
    Ok(conn.execute(&sql, params![now, uid])?)
}

/// Sort rows for display: by scope, then by `display_order`.
pub fn sort_for_display<E: OrderedEntity>(rows: &mut [E]) {
    rows.sort_by_key(|row| (row.scope_key(), row.display_order()));
}
