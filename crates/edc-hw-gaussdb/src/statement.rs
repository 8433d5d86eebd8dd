//! Parameterized statements.

use std::fmt;

use serde_json::Value;

/// A SQL string with `?` placeholders and the values bound to them, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQueryStatement {
    sql: String,
    parameters: Vec<Value>,
}

impl SqlQueryStatement {
    /// Statement without parameters.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self::with_parameters(sql, Vec::new())
    }

    /// Statement with parameters.
    #[must_use]
    pub fn with_parameters(sql: impl Into<String>, parameters: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            parameters,
        }
    }

    /// The SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound values.
    #[must_use]
    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    /// Split into SQL and parameters.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.parameters)
    }
}

impl fmt::Display for SqlQueryStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Accumulates the pieces of a `SELECT` in clause order.
#[derive(Debug)]
pub(crate) struct SelectBuilder {
    select: String,
    from_extras: Vec<String>,
    conditions: Vec<String>,
    order_by: Option<String>,
    parameters: Vec<Value>,
}

impl SelectBuilder {
    pub(crate) fn new(select: String) -> Self {
        Self {
            select,
            from_extras: Vec::new(),
            conditions: Vec::new(),
            order_by: None,
            parameters: Vec::new(),
        }
    }

    /// Add a comma-joined FROM item once.
    pub(crate) fn add_from(&mut self, item: String) {
        if !self.from_extras.contains(&item) {
            self.from_extras.push(item);
        }
    }

    pub(crate) fn add_condition(&mut self, condition: String, parameters: Vec<Value>) {
        self.conditions.push(condition);
        self.parameters.extend(parameters);
    }

    pub(crate) fn order_by(&mut self, expression: String, parameters: Vec<Value>) {
        self.order_by = Some(expression);
        self.parameters.extend(parameters);
    }

    pub(crate) fn build(mut self, limit: u32, offset: u32) -> SqlQueryStatement {
        let mut sql = self.select;
        for item in &self.from_extras {
            sql.push_str(", ");
            sql.push_str(item);
        }
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
        if let Some(order_by) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        sql.push_str(" LIMIT ? OFFSET ?");
        self.parameters.push(Value::from(limit));
        self.parameters.push(Value::from(offset));
        SqlQueryStatement::with_parameters(sql, self.parameters)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_assemble_clauses_in_order() {
        let mut builder = SelectBuilder::new("SELECT t.* FROM t".to_owned());
        builder.add_from("json_array_elements(t.c) AS e".to_owned());
        builder.add_from("json_array_elements(t.c) AS e".to_owned());
        builder.add_condition("t.a = ?".to_owned(), vec![json!("x")]);
        builder.add_condition("e ->> ? = ?".to_owned(), vec![json!("k"), json!("v")]);
        builder.order_by("t.a DESC".to_owned(), Vec::new());

        let statement = builder.build(10, 20);
        assert_eq!(
            statement.sql(),
            "SELECT t.* FROM t, json_array_elements(t.c) AS e WHERE t.a = ? AND e ->> ? = ? \
             ORDER BY t.a DESC LIMIT ? OFFSET ?"
        );
        assert_eq!(
            statement.parameters(),
            [json!("x"), json!("k"), json!("v"), json!(10), json!(20)]
        );
    }

    #[test]
    fn test_should_omit_where_without_conditions() {
        let statement = SelectBuilder::new("SELECT t.* FROM t".to_owned()).build(50, 0);
        assert_eq!(statement.sql(), "SELECT t.* FROM t LIMIT ? OFFSET ?");
        assert_eq!(statement.parameters().len(), 2);
    }
}
