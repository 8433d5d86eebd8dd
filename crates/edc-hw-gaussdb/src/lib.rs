//! GaussDB SQL dialect for the connector's control-plane stores.
//!
//! Nothing here talks to a database. [`StoreStatements`] produces the CRUD
//! templates for each [`Store`] and translates a [`QuerySpec`] into a
//! [`SqlQueryStatement`] with `?` placeholders, ready for a driver to bind.
//!
//! Criteria on fields of a JSON array column (`assetsSelector.operandLeft`
//! on contract definitions) become conditions over
//! `json_array_elements(...)`; JSON document columns are searched with `->>`.

mod criterion;
mod error;
mod schema;
mod statement;
mod stores;

pub use criterion::{Criterion, CriterionOperator, DEFAULT_LIMIT, QuerySpec, SortOrder};
pub use error::{SqlDialectError, SqlResult};
pub use schema::{Column, ColumnKind, JsonArrayColumn, TableSchema};
pub use statement::SqlQueryStatement;
pub use stores::{Store, StoreStatements};
