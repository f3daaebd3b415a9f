//! The DoS `services` column schema.
//!
//! Service rows are positional. [`SERVICE_COLUMNS`] is the single source of
//! the column order: snapshot headers are checked against it, and
//! [`DosService::from_row`](super::DosService::from_row) validates rows
//! against it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::RecordError;

/// The kind of value a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Text,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Integer => f.write_str("integer"),
            ColumnKind::Text => f.write_str("text"),
        }
    }
}

/// One column of the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub nullable: bool,
}

const fn col(name: &'static str, kind: ColumnKind, nullable: bool) -> Column {
    Column {
        name,
        kind,
        nullable,
    }
}

/// Columns of a service row, in row order.
pub const SERVICE_COLUMNS: [Column; 19] = [
    col("id", ColumnKind::Integer, false),
    col("uid", ColumnKind::Text, false),
    col("name", ColumnKind::Text, true),
    col("odscode", ColumnKind::Text, true),
    col("address", ColumnKind::Text, true),
    col("town", ColumnKind::Text, true),
    col("postcode", ColumnKind::Text, true),
    col("web", ColumnKind::Text, true),
    col("email", ColumnKind::Text, true),
    col("fax", ColumnKind::Text, true),
    col("nonpublicphone", ColumnKind::Text, true),
    col("typeid", ColumnKind::Integer, false),
    col("parentid", ColumnKind::Integer, true),
    col("subregionid", ColumnKind::Integer, true),
    col("statusid", ColumnKind::Integer, false),
    col("createdtime", ColumnKind::Text, true),
    col("modifiedtime", ColumnKind::Text, true),
    col("publicphone", ColumnKind::Text, true),
    col("publicname", ColumnKind::Text, true),
];

/// A single value in a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Null,
    Integer(i64),
    Text(String),
}

static NULL: ColumnValue = ColumnValue::Null;

impl ColumnValue {
    fn kind(&self) -> Option<ColumnKind> {
        match self {
            ColumnValue::Null => None,
            ColumnValue::Integer(_) => Some(ColumnKind::Integer),
            ColumnValue::Text(_) => Some(ColumnKind::Text),
        }
    }
}

/// Check that a result-set header names the schema columns in order.
pub fn check_header<S: AsRef<str>>(header: &[S]) -> Result<(), RecordError> {
    if header.len() != SERVICE_COLUMNS.len() {
        return Err(RecordError::Arity {
            expected: SERVICE_COLUMNS.len(),
            found: header.len(),
        });
    }
    for (position, (column, found)) in SERVICE_COLUMNS.iter().zip(header).enumerate() {
        if column.name != found.as_ref() {
            return Err(RecordError::Header {
                position,
                expected: column.name,
                found: found.as_ref().to_string(),
            });
        }
    }
    Ok(())
}

/// A row checked against [`SERVICE_COLUMNS`]; values are read by column name.
pub struct ServiceRow<'a> {
    values: &'a [ColumnValue],
}

impl<'a> ServiceRow<'a> {
    /// Check arity, kinds and nullability.
    pub fn new(values: &'a [ColumnValue]) -> Result<Self, RecordError> {
        if values.len() != SERVICE_COLUMNS.len() {
            return Err(RecordError::Arity {
                expected: SERVICE_COLUMNS.len(),
                found: values.len(),
            });
        }
        for (column, value) in SERVICE_COLUMNS.iter().zip(values) {
            match value.kind() {
                None if !column.nullable => return Err(RecordError::Null { column: column.name }),
                Some(kind) if kind != column.kind => {
                    return Err(RecordError::Kind {
                        column: column.name,
                        expected: column.kind,
                    });
                }
                _ => {}
            }
        }
        Ok(Self { values })
    }

    fn value(&self, name: &str) -> &'a ColumnValue {
        // Names come from this crate, and the row length was checked in new
        let index = SERVICE_COLUMNS
            .iter()
            .position(|c| c.name == name)
            .unwrap_or(SERVICE_COLUMNS.len());
        self.values.get(index).unwrap_or(&NULL)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.value(name) {
            ColumnValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<String> {
        match self.value(name) {
            ColumnValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_order_is_fixed() {
        let names: Vec<&str> = SERVICE_COLUMNS.iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec![
                "id",
                "uid",
                "name",
                "odscode",
                "address",
                "town",
                "postcode",
                "web",
                "email",
                "fax",
                "nonpublicphone",
                "typeid",
                "parentid",
                "subregionid",
                "statusid",
                "createdtime",
                "modifiedtime",
                "publicphone",
                "publicname",
            ]
        );
    }

    #[test]
    fn header_check() {
        let header: Vec<&str> = SERVICE_COLUMNS.iter().map(|c| c.name).collect();
        assert!(check_header(&header).is_ok());

        let mut swapped = header.clone();
        swapped.swap(17, 18);
        assert_eq!(
            check_header(&swapped),
            Err(RecordError::Header {
                position: 17,
                expected: "publicphone",
                found: "publicname".into(),
            })
        );

        assert!(matches!(
            check_header(&header[..18]),
            Err(RecordError::Arity { .. })
        ));
    }

    #[test]
    fn column_values_deserialize_untagged() {
        let values: Vec<ColumnValue> = serde_json::from_str(r#"[1, "a", null]"#).unwrap();
        assert_eq!(
            values,
            vec![
                ColumnValue::Integer(1),
                ColumnValue::Text("a".into()),
                ColumnValue::Null
            ]
        );
    }
}
