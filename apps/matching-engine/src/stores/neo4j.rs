//! Trajectory lookups against Neo4j over its HTTP transactional endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::errors::AppError;
use crate::stores::TrajectoryGraphIndex;

const TYPICAL_ROLES_QUERY: &str =
    "MATCH (t:CareerTrajectory {key: $trajectory}) RETURN t.typical_roles AS roles";

#[derive(Debug, Serialize)]
struct TxRequest<'a> {
    statements: Vec<TxStatement<'a>>,
}

#[derive(Debug, Serialize)]
struct TxStatement<'a> {
    statement: &'a str,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct TxResult {
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Debug, Deserialize)]
struct TxRow {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    code: String,
    message: String,
}

/// Connection settings for the trajectory graph.
#[derive(Debug, Clone)]
pub struct Neo4jSettings {
    pub url: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

#[derive(Clone)]
pub struct Neo4jTrajectoryIndex {
    client: Client,
    settings: Neo4jSettings,
}

impl Neo4jTrajectoryIndex {
    pub fn new(settings: Neo4jSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Graph(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, settings })
    }

    fn commit_url(&self) -> String {
        format!(
            "{}/db/{}/tx/commit",
            self.settings.url.trim_end_matches('/'),
            self.settings.database
        )
    }
}

#[async_trait]
impl TrajectoryGraphIndex for Neo4jTrajectoryIndex {
    async fn typical_roles(&self, trajectory_key: &str) -> Result<Vec<String>, AppError> {
        let request = TxRequest {
            statements: vec![TxStatement {
                statement: TYPICAL_ROLES_QUERY,
                parameters: json!({ "trajectory": trajectory_key }),
            }],
        };

        let response = self
            .client
            .post(self.commit_url())
            .basic_auth(&self.settings.user, Some(&self.settings.password))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Graph(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Graph(format!("status {status}: {body}")));
        }

        let body: TxResponse = response
            .json()
            .await
            .map_err(|e| AppError::Graph(format!("malformed response: {e}")))?;

        let roles = extract_roles(body)?;
        debug!(
            "Trajectory '{trajectory_key}' resolved to {} typical roles",
            roles.len()
        );
        Ok(roles)
    }
}

/// Pulls the `roles` column out of the first row. No node, a null property or
/// non-string entries all count as "no roles".
fn extract_roles(response: TxResponse) -> Result<Vec<String>, AppError> {
    if let Some(err) = response.errors.first() {
        return Err(AppError::Graph(format!("{}: {}", err.code, err.message)));
    }

    let roles = response
        .results
        .into_iter()
        .next()
        .and_then(|result| result.data.into_iter().next())
        .and_then(|row| row.row.into_iter().next())
        .and_then(|value| match value {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            ),
            _ => None,
        })
        .unwrap_or_default();

    Ok(roles)
}
