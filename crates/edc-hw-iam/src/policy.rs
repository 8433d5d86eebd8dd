//! IAM policy documents embedded in security-token requests.

use serde::{Deserialize, Serialize};

/// Policy language version understood by IAM.
pub const POLICY_VERSION: &str = "1.1";

/// The only action granted to provisioned credentials.
pub const PUT_OBJECT_ACTION: &str = "obs:object:PutObject";

/// A policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Policy {
    /// Policy language version.
    pub version: String,
    /// Statements, all of which apply.
    pub statement: Vec<Statement>,
}

/// One policy statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    /// `Allow` or `Deny`.
    pub effect: String,
    /// Granted actions.
    pub action: Vec<String>,
    /// Resources the actions apply to.
    pub resource: Vec<String>,
}

impl Policy {
    /// Policy allowing `PutObject` on `bucket/*` and nothing else.
    ///
    /// # Examples
    ///
    /// ```
    /// use edc_hw_iam::Policy;
    ///
    /// let policy = Policy::put_object_only("test");
    /// assert_eq!(policy.statement.len(), 1);
    /// assert_eq!(policy.statement[0].resource, ["obs:*:*:object:test/*"]);
    /// ```
    #[must_use]
    pub fn put_object_only(bucket_name: &str) -> Self {
        Self {
            version: POLICY_VERSION.to_owned(),
            statement: vec![Statement {
                effect: "Allow".to_owned(),
                action: vec![PUT_OBJECT_ACTION.to_owned()],
                resource: vec![object_resource(bucket_name)],
            }],
        }
    }
}

/// Resource pattern for every object in a bucket.
#[must_use]
pub fn object_resource(bucket_name: &str) -> String {
    format!("obs:*:*:object:{bucket_name}/*")
}
