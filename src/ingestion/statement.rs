//! SQL text for the generated tables.

use crate::error::{ImportError, ImportResult};
use crate::ident::quote;
use crate::types::{ColumnSpec, ColumnType};

/// Pair column names with their types and pick the primary key.
///
/// The first `INTEGER` column named `id` (any case) becomes the primary key; at most one column is
/// marked.
pub fn column_specs<S: AsRef<str>>(
    columns: &[S],
    types: &[ColumnType],
) -> ImportResult<Vec<ColumnSpec>> {
    if columns.len() != types.len() {
        return Err(ImportError::SchemaMismatch {
            message: format!(
                "{} column names but {} column types",
                columns.len(),
                types.len()
            ),
        });
    }

    let pk = columns
        .iter()
        .zip(types)
        .position(|(c, t)| c.as_ref().eq_ignore_ascii_case("id") && *t == ColumnType::Integer);

    Ok(columns
        .iter()
        .zip(types)
        .enumerate()
        .map(|(i, (name, &column_type))| ColumnSpec {
            name: name.as_ref().to_string(),
            column_type,
            primary_key: pk == Some(i),
        })
        .collect())
}

/// `CREATE TABLE IF NOT EXISTS` for the given columns.
pub fn build_create_table<S: AsRef<str>>(
    table: &str,
    columns: &[S],
    types: &[ColumnType],
) -> ImportResult<String> {
    let specs = column_specs(columns, types)?;
    Ok(create_table_sql(table, &specs))
}

/// Render `CREATE TABLE IF NOT EXISTS` from already-built column specs.
pub fn create_table_sql(table: &str, columns: &[ColumnSpec]) -> String {
    let defs: Vec<String> = columns
        .iter()
        .map(|c| {
            let mut def = format!("{} {}", quote(&c.name), c.column_type.sql_name());
            if c.primary_key {
                def.push_str(" PRIMARY KEY");
            }
            def
        })
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote(table),
        defs.join(", ")
    )
}

/// Parameterized `INSERT` with one positional placeholder per column.
pub fn build_insert<S: AsRef<str>>(table: &str, columns: &[S]) -> String {
    let names: Vec<String> = columns.iter().map(|c| quote(c.as_ref())).collect();
    let placeholders = vec!["?"; columns.len()];
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote(table),
        names.join(", "),
        placeholders.join(", ")
    )
}

pub fn build_drop_table(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote(table))
}
