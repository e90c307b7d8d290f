use crate::dataid::{Axis, AxisValue, DataId};
use crate::repo::RepoError;

use log::info;
use rusqlite::Connection;
use rusqlite::types::Value;
use std::path::Path;

/// SQLite registry of known data identifiers, one table per dataset type
/// with one column per axis. Answers metadata queries without touching
/// the stored files.
pub struct Registry {
    conn: Connection,
}

fn check_table_name(dataset: &str) -> Result<(), RepoError> {
    let ok = !dataset.is_empty()
        && dataset
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(RepoError::UnknownDatasetType(dataset.to_string()))
    }
}

fn to_sql_value(value: &AxisValue) -> Value {
    match value {
        AxisValue::Int(v) => Value::Integer(*v),
        AxisValue::Text(v) => Value::Text(v.clone()),
    }
}

fn from_sql_value(axis: Axis, value: Value) -> Result<AxisValue, RepoError> {
    match value {
        Value::Integer(v) => Ok(AxisValue::Int(v)),
        Value::Text(v) => {
            if axis.is_integer() {
                v.parse::<i64>()
                    .map(AxisValue::Int)
                    .map_err(|_| RepoError::InvalidRegistryValue {
                        axis,
                        value: v.clone(),
                    })
            } else {
                Ok(AxisValue::Text(v))
            }
        }
        other => Err(RepoError::InvalidRegistryValue {
            axis,
            value: format!("{:?}", other),
        }),
    }
}

impl Registry {
    /// Opens (or creates) a registry database file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Registry, RepoError> {
        let conn = Connection::open(path.as_ref())?;
        info!("Opened registry {}", path.as_ref().display());
        Ok(Registry { conn })
    }

    pub fn open_in_memory() -> Result<Registry, RepoError> {
        let conn = Connection::open_in_memory()?;
        Ok(Registry { conn })
    }

    pub fn has_dataset(&self, dataset: &str) -> Result<bool, RepoError> {
        check_table_name(dataset)?;
        let mut stmt = self
            .conn
            .prepare("SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)")?;
        let exists: bool = stmt.query_row([dataset], |row| row.get(0))?;
        Ok(exists)
    }

    /// Records one data ID for a dataset type, creating the table on first
    /// use with one column per axis of the ID.
    pub fn insert(&self, dataset: &str, data_id: &DataId) -> Result<(), RepoError> {
        check_table_name(dataset)?;
        let axes: Vec<Axis> = data_id.axes().collect();
        if axes.is_empty() {
            return Err(RepoError::BadTemplate(format!(
                "empty data ID for registry insert into '{}'",
                dataset
            )));
        }

        let columns: Vec<String> = axes
            .iter()
            .map(|a| {
                let ty = if a.is_integer() { "INTEGER" } else { "TEXT" };
                format!("{} {} NOT NULL", a.name(), ty)
            })
            .collect();
        self.conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} ({})",
                dataset,
                columns.join(", ")
            ),
            [],
        )?;

        let names: Vec<&str> = axes.iter().map(|a| a.name()).collect();
        let placeholders: Vec<String> = (1..=axes.len()).map(|i| format!("?{}", i)).collect();
        let values: Vec<Value> = data_id.iter().map(|(_, v)| to_sql_value(v)).collect();
        self.conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES ({})",
                dataset,
                names.join(", "),
                placeholders.join(", ")
            ),
            rusqlite::params_from_iter(values),
        )?;
        Ok(())
    }

    /// Every distinct value of one axis for a dataset type, sorted.
    pub fn query_column(&self, dataset: &str, axis: Axis) -> Result<Vec<AxisValue>, RepoError> {
        check_table_name(dataset)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT DISTINCT {col} FROM {table} ORDER BY {col}",
            col = axis.name(),
            table = dataset
        ))?;
        let rows = stmt.query_map([], |row| row.get::<_, Value>(0))?;
        let mut values = Vec::new();
        for row in rows {
            values.push(from_sql_value(axis, row?)?);
        }
        Ok(values)
    }

    /// Whether a row matching the data ID on the given axes exists.
    pub fn contains(
        &self,
        dataset: &str,
        axes: &[Axis],
        data_id: &DataId,
    ) -> Result<bool, RepoError> {
        check_table_name(dataset)?;
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        for (i, axis) in axes.iter().enumerate() {
            let value = data_id.get(*axis).ok_or_else(|| RepoError::MissingAxis {
                dataset: dataset.to_string(),
                axis: *axis,
            })?;
            clauses.push(format!("{} = ?{}", axis.name(), i + 1));
            params.push(to_sql_value(value));
        }
        let sql = if clauses.is_empty() {
            format!("SELECT EXISTS(SELECT 1 FROM {})", dataset)
        } else {
            format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE {})",
                dataset,
                clauses.join(" AND ")
            )
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let exists: bool = stmt.query_row(rusqlite::params_from_iter(params), |row| row.get(0))?;
        Ok(exists)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").finish_non_exhaustive()
    }
}
