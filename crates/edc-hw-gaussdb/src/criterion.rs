//! Query input: filter criteria, sorting and paging.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use typed_builder::TypedBuilder;

use crate::error::SqlDialectError;

/// Default page size when a query does not set one.
pub const DEFAULT_LIMIT: u32 = 50;

/// Comparison operators accepted in criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CriterionOperator {
    /// Equal (`=`).
    #[serde(rename = "=")]
    Eq,
    /// Not equal (`!=`).
    #[serde(rename = "!=")]
    Ne,
    /// Less than (`<`).
    #[serde(rename = "<")]
    Lt,
    /// Less than or equal (`<=`).
    #[serde(rename = "<=")]
    Le,
    /// Greater than (`>`).
    #[serde(rename = ">")]
    Gt,
    /// Greater than or equal (`>=`).
    #[serde(rename = ">=")]
    Ge,
    /// Membership in a list.
    #[serde(rename = "in")]
    In,
    /// SQL `LIKE` pattern match.
    #[serde(rename = "like")]
    Like,
    /// Case-insensitive `LIKE`.
    #[serde(rename = "ilike")]
    Ilike,
}

impl CriterionOperator {
    /// Symbol used in queries and error messages.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::In => "in",
            Self::Like => "like",
            Self::Ilike => "ilike",
        }
    }

    /// SQL rendering of the operator.
    pub(crate) fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::In => "IN",
            Self::Like => "LIKE",
            Self::Ilike => "ILIKE",
        }
    }
}

impl fmt::Display for CriterionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for CriterionOperator {
    type Err = SqlDialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "=" => Ok(Self::Eq),
            "!=" | "<>" => Ok(Self::Ne),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Le),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Ge),
            "in" => Ok(Self::In),
            "like" => Ok(Self::Like),
            "ilike" => Ok(Self::Ilike),
            _ => Err(SqlDialectError::UnknownOperator(s.to_owned())),
        }
    }
}

/// One filter condition: `operand_left operator operand_right`.
///
/// The left operand is a property path such as `id`, `state` or
/// `assetsSelector.operandLeft`. Path segments containing dots are written in
/// single quotes: `properties.'https://w3id.org/edc/v0.0.1/ns/name'`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    /// Property path.
    pub operand_left: String,
    /// Comparison.
    pub operator: CriterionOperator,
    /// Value compared against. Arrays are only valid with [`CriterionOperator::In`].
    pub operand_right: Value,
}

impl Criterion {
    /// Build a criterion.
    #[must_use]
    pub fn new(
        operand_left: impl Into<String>,
        operator: CriterionOperator,
        operand_right: impl Into<Value>,
    ) -> Self {
        Self {
            operand_left: operand_left.into(),
            operator,
            operand_right: operand_right.into(),
        }
    }

    /// Build a criterion from an operator symbol.
    pub fn parse(
        operand_left: impl Into<String>,
        operator: &str,
        operand_right: impl Into<Value>,
    ) -> Result<Self, SqlDialectError> {
        Ok(Self::new(operand_left, operator.parse()?, operand_right))
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.operand_left, self.operator, self.operand_right
        )
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A structured query against one store.
///
/// ```
/// use edc_hw_gaussdb::{Criterion, CriterionOperator, QuerySpec, SortOrder};
///
/// let query = QuerySpec::builder()
///     .filter(vec![Criterion::new("state", CriterionOperator::Eq, 800)])
///     .sort_field("createdAt")
///     .sort_order(SortOrder::Desc)
///     .limit(10)
///     .build();
/// assert_eq!(query.offset, 0);
/// ```
#[derive(Debug, Clone, PartialEq, TypedBuilder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySpec {
    /// Conditions, all of which must hold.
    #[builder(default)]
    #[serde(default)]
    pub filter: Vec<Criterion>,
    /// Property to sort by.
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    pub sort_field: Option<String>,
    /// Sort direction.
    #[builder(default)]
    #[serde(default)]
    pub sort_order: SortOrder,
    /// Maximum rows returned.
    #[builder(default = DEFAULT_LIMIT)]
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Rows skipped.
    #[builder(default)]
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_operator_symbols() {
        assert_eq!("=".parse::<CriterionOperator>(), Ok(CriterionOperator::Eq));
        assert_eq!("<>".parse::<CriterionOperator>(), Ok(CriterionOperator::Ne));
        assert_eq!("IN".parse::<CriterionOperator>(), Ok(CriterionOperator::In));
        assert_eq!(
            "~".parse::<CriterionOperator>(),
            Err(SqlDialectError::UnknownOperator("~".into()))
        );
    }

    #[test]
    fn test_should_deserialize_query_with_defaults() {
        let query: QuerySpec = serde_json::from_str(
            r#"{"filter":[{"operandLeft":"id","operator":"=","operandRight":"a"}]}"#,
        )
        .expect("query");
        assert_eq!(query.limit, DEFAULT_LIMIT);
        assert_eq!(query.sort_order, SortOrder::Asc);
        assert_eq!(query.filter[0].to_string(), r#"id = "a""#);
    }
}
