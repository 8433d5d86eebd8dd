//! Statement builders for the control-plane stores.

use std::fmt;

use tracing::trace;

use crate::criterion::QuerySpec;
use crate::error::{SqlDialectError, SqlResult};
use crate::schema::{Column, ColumnKind, Condition, JsonArrayColumn, Operand, TableSchema};
use crate::statement::{SelectBuilder, SqlQueryStatement};

static ASSETS: TableSchema = TableSchema {
    table: "edc_asset",
    id_column: "asset_id",
    columns: &[
        Column::scalar("id", "asset_id"),
        Column::scalar("createdAt", "created_at"),
        Column::json("properties", "properties"),
        Column::json("privateProperties", "private_properties"),
        Column::json("dataAddress", "data_address"),
    ],
    fallback_json: Some("properties"),
    json_array: None,
    unsupported: &[],
};

static CONTRACT_DEFINITIONS: TableSchema = TableSchema {
    table: "edc_contract_definitions",
    id_column: "contract_definition_id",
    columns: &[
        Column::scalar("id", "contract_definition_id"),
        Column::scalar("createdAt", "created_at"),
        Column::scalar("accessPolicyId", "access_policy_id"),
        Column::scalar("contractPolicyId", "contract_policy_id"),
        Column::json("assetsSelector", "assets_selector"),
        Column::json("privateProperties", "private_properties"),
    ],
    fallback_json: None,
    json_array: Some(JsonArrayColumn {
        property: "assetsSelector",
        column: "assets_selector",
        alias: "crit",
        fields: &["operandLeft", "operator", "operandRight"],
    }),
    unsupported: &[],
};

static CONTRACT_NEGOTIATIONS: TableSchema = TableSchema {
    table: "edc_contract_negotiation",
    id_column: "id",
    columns: &[
        Column::scalar("id", "id"),
        Column::scalar("createdAt", "created_at"),
        Column::scalar("updatedAt", "updated_at"),
        Column::scalar("correlationId", "correlation_id"),
        Column::scalar("counterPartyId", "counterparty_id"),
        Column::scalar("counterPartyAddress", "counterparty_address"),
        Column::scalar("protocol", "protocol"),
        Column::scalar("type", "type"),
        Column::scalar("state", "state"),
        Column::scalar("stateCount", "state_count"),
        Column::scalar("stateTimestamp", "state_timestamp"),
        Column::scalar("errorDetail", "error_detail"),
        Column::scalar("agreementId", "agreement_id"),
        Column::json("contractOffers", "contract_offers"),
        Column::json("callbackAddresses", "callback_addresses"),
        Column::json("traceContext", "trace_context"),
        Column::scalar("pending", "pending"),
        Column::json("protocolMessages", "protocol_messages"),
    ],
    fallback_json: None,
    json_array: None,
    unsupported: &["contractAgreement"],
};

static TRANSFER_PROCESSES: TableSchema = TableSchema {
    table: "edc_transfer_process",
    id_column: "transferprocess_id",
    columns: &[
        Column::scalar("id", "transferprocess_id"),
        Column::scalar("type", "type"),
        Column::scalar("state", "state"),
        Column::scalar("stateCount", "state_count"),
        Column::scalar("stateTimestamp", "state_time_stamp"),
        Column::scalar("createdAt", "created_at"),
        Column::scalar("updatedAt", "updated_at"),
        Column::json("traceContext", "trace_context"),
        Column::scalar("errorDetail", "error_detail"),
        Column::json("resourceManifest", "resource_manifest"),
        Column::json("provisionedResourceSet", "provisioned_resource_set"),
        Column::json("contentDataAddress", "content_data_address"),
        Column::json("deprovisionedResources", "deprovisioned_resources"),
        Column::json("privateProperties", "private_properties"),
        Column::json("callbackAddresses", "callback_addresses"),
        Column::scalar("pending", "pending"),
        Column::scalar("transferType", "transfer_type"),
        Column::json("protocolMessages", "protocol_messages"),
        Column::scalar("dataPlaneId", "data_plane_id"),
        Column::scalar("correlationId", "correlation_id"),
        Column::scalar("counterPartyAddress", "counter_party_address"),
        Column::scalar("protocol", "protocol"),
        Column::scalar("assetId", "asset_id"),
        Column::scalar("contractId", "contract_id"),
        Column::json("dataDestination", "data_destination"),
    ],
    fallback_json: None,
    json_array: None,
    unsupported: &[],
};

static POLICY_DEFINITIONS: TableSchema = TableSchema {
    table: "edc_policydefinitions",
    id_column: "policy_id",
    columns: &[
        Column::scalar("id", "policy_id"),
        Column::scalar("createdAt", "created_at"),
        Column::json("policy.permissions", "permissions"),
        Column::json("policy.prohibitions", "prohibitions"),
        Column::json("policy.obligations", "duties"),
        Column::json("policy.profiles", "profiles"),
        Column::json("policy.extensibleProperties", "extensible_properties"),
        Column::scalar("policy.inheritsFrom", "inherits_from"),
        Column::scalar("policy.assigner", "assigner"),
        Column::scalar("policy.assignee", "assignee"),
        Column::scalar("policy.target", "target"),
        Column::scalar("policy.type", "policy_type"),
        Column::json("privateProperties", "private_properties"),
    ],
    fallback_json: None,
    json_array: None,
    unsupported: &[],
};

static POLICY_MONITOR: TableSchema = TableSchema {
    table: "edc_policy_monitor",
    id_column: "entry_id",
    columns: &[
        Column::scalar("id", "entry_id"),
        Column::scalar("state", "state"),
        Column::scalar("createdAt", "created_at"),
        Column::scalar("updatedAt", "updated_at"),
        Column::scalar("stateCount", "state_count"),
        Column::scalar("stateTimestamp", "state_time_stamp"),
        Column::json("traceContext", "trace_context"),
        Column::scalar("errorDetail", "error_detail"),
        Column::json("properties", "properties"),
        Column::scalar("contractId", "contract_id"),
    ],
    fallback_json: None,
    json_array: None,
    unsupported: &[],
};

static DATA_PLANE_INSTANCES: TableSchema = TableSchema {
    table: "edc_data_plane_instance",
    id_column: "id",
    columns: &[Column::scalar("id", "id"), Column::json("data", "data")],
    fallback_json: Some("data"),
    json_array: None,
    unsupported: &[],
};

/// The stores backed by GaussDB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Store {
    /// Assets.
    Assets,
    /// Contract definitions.
    ContractDefinitions,
    /// Contract negotiations.
    ContractNegotiations,
    /// Transfer processes.
    TransferProcesses,
    /// Policy definitions.
    PolicyDefinitions,
    /// Policy-monitor entries.
    PolicyMonitor,
    /// Data-plane instances.
    DataPlaneInstances,
}

impl Store {
    /// Every store.
    pub const ALL: [Self; 7] = [
        Self::Assets,
        Self::ContractDefinitions,
        Self::ContractNegotiations,
        Self::TransferProcesses,
        Self::PolicyDefinitions,
        Self::PolicyMonitor,
        Self::DataPlaneInstances,
    ];

    /// Table layout.
    #[must_use]
    pub fn schema(self) -> &'static TableSchema {
        match self {
            Self::Assets => &ASSETS,
            Self::ContractDefinitions => &CONTRACT_DEFINITIONS,
            Self::ContractNegotiations => &CONTRACT_NEGOTIATIONS,
            Self::TransferProcesses => &TRANSFER_PROCESSES,
            Self::PolicyDefinitions => &POLICY_DEFINITIONS,
            Self::PolicyMonitor => &POLICY_MONITOR,
            Self::DataPlaneInstances => &DATA_PLANE_INSTANCES,
        }
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema().table)
    }
}

/// Statements for one store.
///
/// Templates bind columns in [`TableSchema::columns`] order; JSON columns take
/// `?::json`. Queries are built from a [`QuerySpec`].
///
/// ```
/// use edc_hw_gaussdb::{Criterion, CriterionOperator, QuerySpec, Store, StoreStatements};
///
/// let statements = StoreStatements::new(Store::ContractDefinitions);
/// let query = QuerySpec::builder()
///     .filter(vec![Criterion::new(
///         "assetsSelector.operandLeft",
///         CriterionOperator::Eq,
///         "id",
///     )])
///     .build();
/// let statement = statements.create_query(&query).unwrap();
/// assert!(statement.sql().contains("json_array_elements"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStatements {
    store: Store,
}

impl StoreStatements {
    /// Statements for `store`.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// The store.
    #[must_use]
    pub fn store(&self) -> Store {
        self.store
    }

    fn schema(&self) -> &'static TableSchema {
        self.store.schema()
    }

    /// `SELECT` of one row by primary key.
    #[must_use]
    pub fn find_by_id_template(&self) -> String {
        let schema = self.schema();
        format!(
            "SELECT * FROM {} WHERE {} = ?",
            schema.table, schema.id_column
        )
    }

    /// `INSERT` of every column.
    #[must_use]
    pub fn insert_template(&self) -> String {
        let schema = self.schema();
        let names: Vec<&str> = schema.columns.iter().map(|c| c.name).collect();
        let placeholders: Vec<&str> = schema.columns.iter().map(Column::placeholder).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            schema.table,
            names.join(", "),
            placeholders.join(", ")
        )
    }

    /// `UPDATE` of every non-key column; the key is bound last.
    #[must_use]
    pub fn update_template(&self) -> String {
        let schema = self.schema();
        let assignments: Vec<String> = schema
            .columns
            .iter()
            .filter(|c| c.name != schema.id_column)
            .map(|c| format!("{} = {}", c.name, c.placeholder()))
            .collect();
        format!(
            "UPDATE {} SET {} WHERE {} = ?",
            schema.table,
            assignments.join(", "),
            schema.id_column
        )
    }

    /// `DELETE` of one row by primary key.
    #[must_use]
    pub fn delete_by_id_template(&self) -> String {
        let schema = self.schema();
        format!("DELETE FROM {} WHERE {} = ?", schema.table, schema.id_column)
    }

    /// `SELECT COUNT(*)` of rows matching a primary key.
    #[must_use]
    pub fn count_by_id_template(&self) -> String {
        let schema = self.schema();
        format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?",
            schema.table, schema.id_column
        )
    }

    /// Translate `query` into a paged `SELECT`.
    ///
    /// Criteria on elements of a JSON array column are taken out of the plain
    /// filter and appended after it, with the array expanded in the FROM
    /// clause. Any criterion or sort field naming an unknown property fails the
    /// whole query.
    pub fn create_query(&self, query: &QuerySpec) -> SqlResult<SqlQueryStatement> {
        let schema = self.schema();
        let mut builder = SelectBuilder::new(format!(
            "SELECT {table}.* FROM {table}",
            table = schema.table
        ));

        let mut element_conditions = Vec::new();
        for criterion in &query.filter {
            match schema.condition(criterion)? {
                Condition::Plain { sql, parameters } => builder.add_condition(sql, parameters),
                element @ Condition::ArrayElement { .. } => element_conditions.push(element),
            }
        }
        for condition in element_conditions {
            if let Condition::ArrayElement {
                from,
                sql,
                parameters,
            } = condition
            {
                builder.add_from(from);
                builder.add_condition(sql, parameters);
            }
        }

        if let Some(field) = &query.sort_field {
            match schema.resolve(field)? {
                Operand::Column {
                    expression,
                    parameters,
                } => builder.order_by(
                    format!("{expression} {}", query.sort_order.sql()),
                    parameters,
                ),
                Operand::ArrayElement { .. } => {
                    return Err(SqlDialectError::UnsupportedOperand {
                        table: schema.table,
                        operand: field.clone(),
                        reason: "cannot sort by array elements",
                    });
                }
            }
        }

        let statement = builder.build(query.limit, query.offset);
        trace!(table = schema.table, sql = statement.sql(), "translated query");
        Ok(statement)
    }

    /// Whether `column` holds JSON.
    #[must_use]
    pub fn is_json_column(&self, column: &str) -> bool {
        self.schema()
            .columns
            .iter()
            .any(|c| c.name == column && c.kind == ColumnKind::Json)
    }
}
