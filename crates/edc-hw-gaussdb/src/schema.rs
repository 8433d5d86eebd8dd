//! Table layouts and the translation of property paths to column expressions.

use serde_json::Value;

use crate::criterion::{Criterion, CriterionOperator};
use crate::error::{SqlDialectError, SqlResult};

/// How a column is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Scalar value.
    Scalar,
    /// `json` document; bound as `?::json`, queried with `->>`.
    Json,
}

/// One table column and the property path that addresses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Property name used in criteria and sort fields.
    pub property: &'static str,
    /// Column name.
    pub name: &'static str,
    /// Binding.
    pub kind: ColumnKind,
}

impl Column {
    /// Scalar column.
    #[must_use]
    pub const fn scalar(property: &'static str, name: &'static str) -> Self {
        Self {
            property,
            name,
            kind: ColumnKind::Scalar,
        }
    }

    /// JSON column.
    #[must_use]
    pub const fn json(property: &'static str, name: &'static str) -> Self {
        Self {
            property,
            name,
            kind: ColumnKind::Json,
        }
    }

    pub(crate) fn placeholder(&self) -> &'static str {
        match self.kind {
            ColumnKind::Scalar => "?",
            ColumnKind::Json => "?::json",
        }
    }
}

/// A JSON column holding an array of objects whose fields are filtered by
/// expanding the array with `json_array_elements`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonArrayColumn {
    /// Property prefix, e.g. `assetsSelector`.
    pub property: &'static str,
    /// Column name.
    pub column: &'static str,
    /// Alias of each expanded element.
    pub alias: &'static str,
    /// Fields an element may be filtered on.
    pub fields: &'static [&'static str],
}

/// Layout of one store's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    /// Table name.
    pub table: &'static str,
    /// Primary key column.
    pub id_column: &'static str,
    /// Every column, in insert order. The id column comes first.
    pub columns: &'static [Column],
    /// JSON column searched for operands that match no column, keyed by the
    /// whole operand.
    pub fallback_json: Option<&'static str>,
    /// Array column expanded for element criteria.
    pub json_array: Option<JsonArrayColumn>,
    /// Property prefixes that are known but cannot be queried here.
    pub unsupported: &'static [&'static str],
}

/// A resolved left operand.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    /// `<table>.<column> [-> ? ...] [->> ?]`
    Column {
        expression: String,
        parameters: Vec<Value>,
    },
    /// `<alias> ->> ?` over the expanded array column.
    ArrayElement { field: String },
}

impl TableSchema {
    /// Column addressed by `property`.
    #[must_use]
    pub fn column(&self, property: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.property == property)
    }

    fn qualified(&self, column: &str) -> String {
        format!("{}.{column}", self.table)
    }

    fn unknown(&self, operand: &str) -> SqlDialectError {
        SqlDialectError::UnknownOperand {
            table: self.table,
            operand: operand.to_owned(),
        }
    }

    fn unsupported(&self, operand: &str, reason: &'static str) -> SqlDialectError {
        SqlDialectError::UnsupportedOperand {
            table: self.table,
            operand: operand.to_owned(),
            reason,
        }
    }

    /// Translate a property path into a column expression.
    pub(crate) fn resolve(&self, operand: &str) -> SqlResult<Operand> {
        let path = split_path(operand)?;
        let Some((head, rest)) = path.split_first() else {
            return Err(self.unknown(operand));
        };

        if let Some(array) = &self.json_array
            && head == array.property
        {
            return match rest {
                [field] if array.fields.contains(&field.as_str()) => Ok(Operand::ArrayElement {
                    field: field.clone(),
                }),
                _ => Err(self.unknown(operand)),
            };
        }

        if self.unsupported.contains(&head.as_str()) {
            return Err(self.unsupported(operand, "stored outside this table"));
        }

        // Column properties may themselves be dotted, e.g. `policy.permissions`.
        let matched = (1..=path.len())
            .rev()
            .find_map(|n| self.column(&path[..n].join(".")).map(|c| (c, &path[n..])));
        if let Some((column, rest)) = matched {
            return match (column.kind, rest) {
                (ColumnKind::Scalar, []) => Ok(Operand::Column {
                    expression: self.qualified(column.name),
                    parameters: Vec::new(),
                }),
                (ColumnKind::Scalar, _) => Err(self.unsupported(operand, "column is not JSON")),
                (ColumnKind::Json, []) => {
                    Err(self.unsupported(operand, "JSON column needs a field path"))
                }
                (ColumnKind::Json, _) => Ok(json_path(&self.qualified(column.name), rest)),
            };
        }

        match self.fallback_json {
            Some(column) => Ok(json_path(
                &self.qualified(column),
                &[unquote(operand).to_owned()],
            )),
            None => Err(self.unknown(operand)),
        }
    }

    /// Translate one criterion into a condition and its parameters.
    pub(crate) fn condition(&self, criterion: &Criterion) -> SqlResult<Condition> {
        match self.resolve(&criterion.operand_left)? {
            Operand::Column {
                expression,
                mut parameters,
            } => {
                let (sql, values) = comparison(&expression, criterion)?;
                parameters.extend(values);
                Ok(Condition::Plain { sql, parameters })
            }
            Operand::ArrayElement { field } => {
                let Some(array) = &self.json_array else {
                    return Err(self.unknown(&criterion.operand_left));
                };
                let expression = format!("{} ->> ?", array.alias);
                let (sql, values) = comparison(&expression, criterion)?;
                let mut parameters = vec![Value::String(field)];
                parameters.extend(values);
                Ok(Condition::ArrayElement {
                    from: format!(
                        "json_array_elements({}) AS {}",
                        self.qualified(array.column),
                        array.alias
                    ),
                    sql,
                    parameters,
                })
            }
        }
    }
}

/// A translated criterion.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Condition {
    /// Goes straight into the WHERE clause.
    Plain { sql: String, parameters: Vec<Value> },
    /// Needs `from` joined into the FROM clause.
    ArrayElement {
        from: String,
        sql: String,
        parameters: Vec<Value>,
    },
}

fn json_path(column: &str, path: &[String]) -> Operand {
    let mut expression = column.to_owned();
    let last = path.len().saturating_sub(1);
    for i in 0..path.len() {
        expression.push_str(if i == last { " ->> ?" } else { " -> ?" });
    }
    Operand::Column {
        expression,
        parameters: path.iter().cloned().map(Value::String).collect(),
    }
}

fn comparison(expression: &str, criterion: &Criterion) -> SqlResult<(String, Vec<Value>)> {
    let operator = criterion.operator;
    let invalid = |reason| SqlDialectError::InvalidRightOperand {
        operator: operator.symbol(),
        reason,
    };

    match (&criterion.operand_right, operator) {
        (Value::Array(values), CriterionOperator::In) => {
            if values.is_empty() {
                return Err(invalid("list must not be empty"));
            }
            let placeholders = vec!["?"; values.len()].join(", ");
            Ok((
                format!("{expression} IN ({placeholders})"),
                values.clone(),
            ))
        }
        (_, CriterionOperator::In) => Err(invalid("expected a list")),
        (Value::Array(_) | Value::Object(_), _) => Err(invalid("expected a scalar")),
        (Value::Null, CriterionOperator::Eq) => Ok((format!("{expression} IS NULL"), Vec::new())),
        (Value::Null, CriterionOperator::Ne) => {
            Ok((format!("{expression} IS NOT NULL"), Vec::new()))
        }
        (Value::Null, _) => Err(invalid("null only compares with = or !=")),
        (value, _) => Ok((
            format!("{expression} {} ?", operator.sql()),
            vec![value.clone()],
        )),
    }
}

/// Split `a.b.'c.d'` into `["a", "b", "c.d"]`.
fn split_path(operand: &str) -> SqlResult<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for ch in operand.chars() {
        match ch {
            '\'' => quoted = !quoted,
            '.' if !quoted => segments.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    if quoted {
        return Err(SqlDialectError::UnterminatedQuote(operand.to_owned()));
    }
    segments.push(current);

    if segments.iter().any(String::is_empty) {
        return Ok(Vec::new());
    }
    Ok(segments)
}

fn unquote(operand: &str) -> &str {
    operand
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(operand)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const TABLE: TableSchema = TableSchema {
        table: "t",
        id_column: "id",
        columns: &[
            Column::scalar("id", "id"),
            Column::json("properties", "properties"),
        ],
        fallback_json: None,
        json_array: None,
        unsupported: &["agreement"],
    };

    #[test]
    fn test_should_split_quoted_segments() {
        assert_eq!(
            split_path("properties.'https://w3id.org/ns/name'").expect("path"),
            ["properties", "https://w3id.org/ns/name"]
        );
        assert_eq!(split_path("a.b.c").expect("path"), ["a", "b", "c"]);
        assert!(split_path("a..b").expect("path").is_empty());
        assert!(matches!(
            split_path("a.'b"),
            Err(SqlDialectError::UnterminatedQuote(_))
        ));
    }

    #[test]
    fn test_should_resolve_nested_json_path() {
        let operand = TABLE.resolve("properties.a.b").expect("operand");
        assert_eq!(
            operand,
            Operand::Column {
                expression: "t.properties -> ? ->> ?".into(),
                parameters: vec![json!("a"), json!("b")],
            }
        );
    }

    #[test]
    fn test_should_reject_unknown_and_unsupported_operands() {
        assert!(matches!(
            TABLE.resolve("missing"),
            Err(SqlDialectError::UnknownOperand { .. })
        ));
        assert!(matches!(
            TABLE.resolve("agreement.policy"),
            Err(SqlDialectError::UnsupportedOperand { .. })
        ));
        assert!(matches!(
            TABLE.resolve("id.x"),
            Err(SqlDialectError::UnsupportedOperand { .. })
        ));
        assert!(matches!(
            TABLE.resolve("properties"),
            Err(SqlDialectError::UnsupportedOperand { .. })
        ));
    }

    #[test]
    fn test_should_render_null_and_list_comparisons() {
        let null = TABLE
            .condition(&Criterion::new("id", CriterionOperator::Eq, Value::Null))
            .expect("null");
        assert_eq!(
            null,
            Condition::Plain {
                sql: "t.id IS NULL".into(),
                parameters: Vec::new(),
            }
        );

        let list = TABLE
            .condition(&Criterion::new("id", CriterionOperator::In, json!(["a", "b"])))
            .expect("list");
        assert_eq!(
            list,
            Condition::Plain {
                sql: "t.id IN (?, ?)".into(),
                parameters: vec![json!("a"), json!("b")],
            }
        );

        assert!(matches!(
            TABLE.condition(&Criterion::new("id", CriterionOperator::In, json!([]))),
            Err(SqlDialectError::InvalidRightOperand { .. })
        ));
        assert!(matches!(
            TABLE.condition(&Criterion::new("id", CriterionOperator::Eq, json!(["a"]))),
            Err(SqlDialectError::InvalidRightOperand { .. })
        ));
    }
}
