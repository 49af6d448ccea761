//! Builds parameterized SELECT, COUNT, EXISTS, INSERT and UPDATE statements from entity metadata.

use crate::case::{to_camel_case, to_snake_case};
use crate::data::{Filter, FilterOp};
use crate::entity::{ColumnInfo, Entity, ACTIVE_COLUMN, ID_COLUMN, LAST_MODIFIED_BY_COLUMN, LAST_MODIFIED_DATE_COLUMN};
use crate::error::CrudError;
use crate::models::PageRequest;
use serde_json::{Map, Value};
use uuid::Uuid;

const DEFAULT_SORT_COLUMN: &str = "created_date";

/// Quote identifier for PostgreSQL (safe: only from entity metadata or configuration).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }

    /// Push a value and return its placeholder cast to `pg_type`.
    fn placeholder(&mut self, v: Value, pg_type: &str) -> String {
        let n = self.push_param(v);
        format!("${}::{}", n, pg_type)
    }
}

fn select_column_list<E: Entity>() -> String {
    E::columns()
        .iter()
        .map(|c| quoted(c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn id_predicate(q: &mut QueryBuf, id: Uuid) -> String {
    let ph = q.placeholder(Value::String(id.to_string()), "uuid");
    format!("{} = {} AND {} = TRUE", quoted(ID_COLUMN), ph, quoted(ACTIVE_COLUMN))
}

/// SELECT one active row by id.
pub fn select_by_id<E: Entity>(schema: &str, id: Uuid) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, E::TABLE);
    let predicate = id_predicate(&mut q, id);
    q.sql = format!("SELECT {} FROM {} WHERE {}", select_column_list::<E>(), table, predicate);
    q
}

/// [`select_by_id`] that also locks the row until the transaction ends.
pub fn select_by_id_for_update<E: Entity>(schema: &str, id: Uuid) -> QueryBuf {
    let mut q = select_by_id::<E>(schema, id);
    q.sql.push_str(" FOR UPDATE");
    q
}

/// SELECT EXISTS for one active row by id.
pub fn exists_by_id<E: Entity>(schema: &str, id: Uuid) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, E::TABLE);
    let predicate = id_predicate(&mut q, id);
    q.sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE {})", table, predicate);
    q
}

/// `%`, `_` and the escape character itself are literal in a substring match.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn filter_predicate(q: &mut QueryBuf, filter: &Filter, col: &ColumnInfo) -> String {
    let name = quoted(col.name);
    match &filter.op {
        FilterOp::Equals(v) => format!("{} = {}", name, q.placeholder(v.clone(), col.pg_type)),
        FilterOp::NotEquals(v) => format!("{} <> {}", name, q.placeholder(v.clone(), col.pg_type)),
        FilterOp::InSet(values) => {
            if values.is_empty() {
                return "FALSE".to_string();
            }
            let placeholders: Vec<String> = values
                .iter()
                .map(|v| q.placeholder(v.clone(), col.pg_type))
                .collect();
            format!("{} IN ({})", name, placeholders.join(", "))
        }
        FilterOp::Range { min, max } => {
            let mut parts = Vec::new();
            if let Some(v) = min {
                parts.push(format!("{} >= {}", name, q.placeholder(v.clone(), col.pg_type)));
            }
            if let Some(v) = max {
                parts.push(format!("{} <= {}", name, q.placeholder(v.clone(), col.pg_type)));
            }
            if parts.is_empty() {
                "TRUE".to_string()
            } else {
                parts.join(" AND ")
            }
        }
        FilterOp::Contains(s) => {
            let ph = q.placeholder(Value::String(escape_like(s)), "text");
            format!("{}::text LIKE '%' || {} || '%'", name, ph)
        }
        FilterOp::IContains(s) => {
            let ph = q.placeholder(Value::String(escape_like(s)), "text");
            format!("{}::text ILIKE '%' || {} || '%'", name, ph)
        }
    }
}

fn filter_predicates<E: Entity>(q: &mut QueryBuf, filters: &[Filter], parts: &mut Vec<String>) -> Result<(), CrudError> {
    for f in filters {
        let col = E::column(&f.field).ok_or_else(|| CrudError::InvalidFilterField(f.field.clone()))?;
        parts.push(filter_predicate(q, f, col));
    }
    Ok(())
}

/// WHERE clause for a filter conjunction. Adds `is_active = TRUE` unless a
/// filter already constrains the active flag.
fn where_clause<E: Entity>(q: &mut QueryBuf, filters: &[Filter]) -> Result<String, CrudError> {
    let mut parts = Vec::with_capacity(filters.len() + 1);
    if !filters.iter().any(|f| f.targets(ACTIVE_COLUMN)) {
        parts.push(format!("{} = TRUE", quoted(ACTIVE_COLUMN)));
    }
    filter_predicates::<E>(q, filters, &mut parts)?;
    Ok(format!(" WHERE {}", parts.join(" AND ")))
}

/// SELECT EXISTS for any row matching the filters (active rows unless a filter
/// targets the active flag).
pub fn exists_where<E: Entity>(schema: &str, filters: &[Filter]) -> Result<QueryBuf, CrudError> {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, E::TABLE);
    let where_sql = where_clause::<E>(&mut q, filters)?;
    q.sql = format!("SELECT EXISTS(SELECT 1 FROM {}{})", table, where_sql);
    Ok(q)
}

/// Map an external (camelCase) sort field to a known column.
fn sort_column<E: Entity>(sort_by: &str) -> Result<&'static ColumnInfo, CrudError> {
    E::column(&to_snake_case(sort_by)).ok_or_else(|| {
        let allowed: Vec<String> = E::columns().iter().map(|c| to_camel_case(c.name)).collect();
        CrudError::InvalidSortField(format!("{} (allowed: {})", sort_by, allowed.join(", ")))
    })
}

/// Page query plus the matching COUNT query (same filters, no ordering or window).
///
/// The id column is always the last sort key so pages never overlap. The page
/// query is `None` when the window starts past any addressable row.
pub fn select_page<E: Entity>(
    schema: &str,
    page: &PageRequest,
) -> Result<(Option<QueryBuf>, QueryBuf), CrudError> {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, E::TABLE);
    let where_sql = where_clause::<E>(&mut q, &page.filters)?;

    let sort_col = match page.sort_by.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(s) => sort_column::<E>(s)?.name,
        None => DEFAULT_SORT_COLUMN,
    };
    let dir = page.sort_direction.as_sql();
    let mut order_clause = format!(" ORDER BY {} {}", quoted(sort_col), dir);
    if sort_col != ID_COLUMN {
        order_clause.push_str(&format!(", {} {}", quoted(ID_COLUMN), dir));
    }
    let count = QueryBuf {
        sql: format!("SELECT COUNT(*) FROM {}{}", table, where_sql),
        params: q.params.clone(),
    };
    let window = if page.omit_pagination {
        String::new()
    } else {
        match page.window() {
            Some((limit, offset)) => format!(" LIMIT {} OFFSET {}", limit, offset),
            None => return Ok((None, count)),
        }
    };
    q.sql = format!(
        "SELECT {} FROM {}{}{}{}",
        select_column_list::<E>(),
        table,
        where_sql,
        order_clause,
        window
    );
    Ok((Some(q), count))
}

/// INSERT every mapped column; values come from the serialized entity (missing keys bind NULL).
pub fn insert<E: Entity>(schema: &str, row: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, E::TABLE);
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in E::columns() {
        let val = row.get(c.name).cloned().unwrap_or(Value::Null);
        placeholders.push(q.placeholder(val, c.pg_type));
        cols.push(quoted(c.name));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        table,
        cols.join(", "),
        placeholders.join(", "),
        select_column_list::<E>()
    );
    q
}

/// UPDATE one active row: SET only updatable columns present in `changes`,
/// always bumping the last-modified pair.
pub fn update<E: Entity>(schema: &str, id: Uuid, changes: &Map<String, Value>, actor_id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, E::TABLE);
    let mut sets = Vec::new();
    for c in E::columns() {
        if !c.updatable || c.name == LAST_MODIFIED_DATE_COLUMN || c.name == LAST_MODIFIED_BY_COLUMN {
            continue;
        }
        let Some(v) = changes.get(c.name) else { continue };
        let rhs = q.placeholder(v.clone(), c.pg_type);
        sets.push(format!("{} = {}", quoted(c.name), rhs));
    }
    sets.push(format!("{} = NOW()", quoted(LAST_MODIFIED_DATE_COLUMN)));
    let actor = q.placeholder(Value::String(actor_id.to_string()), "text");
    sets.push(format!("{} = {}", quoted(LAST_MODIFIED_BY_COLUMN), actor));
    let predicate = id_predicate(&mut q, id);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} RETURNING {}",
        table,
        sets.join(", "),
        predicate,
        select_column_list::<E>()
    );
    q
}

/// Soft delete: clear the active flag of one active row.
pub fn soft_delete<E: Entity>(schema: &str, id: Uuid, actor_id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, E::TABLE);
    let actor = q.placeholder(Value::String(actor_id.to_string()), "text");
    let predicate = id_predicate(&mut q, id);
    q.sql = format!(
        "UPDATE {} SET {} = FALSE, {} = NOW(), {} = {} WHERE {}",
        table,
        quoted(ACTIVE_COLUMN),
        quoted(LAST_MODIFIED_DATE_COLUMN),
        quoted(LAST_MODIFIED_BY_COLUMN),
        actor,
        predicate
    );
    q
}

/// Soft delete every active row matching the filters. Rows already inactive
/// are left alone even when a filter targets the active flag.
pub fn soft_delete_where<E: Entity>(schema: &str, filters: &[Filter], actor_id: &str) -> Result<QueryBuf, CrudError> {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, E::TABLE);
    let actor = q.placeholder(Value::String(actor_id.to_string()), "text");
    let mut parts = vec![format!("{} = TRUE", quoted(ACTIVE_COLUMN))];
    filter_predicates::<E>(&mut q, filters, &mut parts)?;
    q.sql = format!(
        "UPDATE {} SET {} = FALSE, {} = NOW(), {} = {} WHERE {}",
        table,
        quoted(ACTIVE_COLUMN),
        quoted(LAST_MODIFIED_DATE_COLUMN),
        quoted(LAST_MODIFIED_BY_COLUMN),
        actor,
        parts.join(" AND ")
    );
    Ok(q)
}
