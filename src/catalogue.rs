//! Typed client for the external test-case catalogue service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::config::CatalogueConfig;
use crate::error::{RamError, RamResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub jira_ticket: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[async_trait]
pub trait TestCatalogue: Send + Sync {
    /// `None` when the catalogue does not know the project.
    async fn get_project(&self, id: Uuid) -> RamResult<Option<Project>>;

    async fn list_test_cases(&self, project_id: Uuid) -> RamResult<Vec<TestCase>>;
}

pub struct HttpTestCatalogue {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTestCatalogue {
    pub fn new(config: &CatalogueConfig) -> RamResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RamError::Internal(format!("cannot build catalogue client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> RamResult<Option<T>> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "catalogue request");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RamError::Catalogue(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response
                    .json::<T>()
                    .await
                    .map_err(|e| RamError::Catalogue(format!("invalid response from {}: {}", url, e)))?;
                Ok(Some(body))
            }
            status => Err(RamError::Catalogue(format!("{} answered {}", url, status))),
        }
    }
}

#[async_trait]
impl TestCatalogue for HttpTestCatalogue {
    async fn get_project(&self, id: Uuid) -> RamResult<Option<Project>> {
        self.fetch(&format!("/api/v1/projects/{}", id)).await
    }

    async fn list_test_cases(&self, project_id: Uuid) -> RamResult<Vec<TestCase>> {
        let cases: Option<Vec<TestCase>> = self
            .fetch(&format!("/api/v1/projects/{}/test-cases", project_id))
            .await?;
        Ok(cases.unwrap_or_default())
    }
}

/// Project name for reports; catalogue failures fall back to the raw id.
pub async fn project_name(catalogue: &dyn TestCatalogue, project_id: Option<Uuid>) -> Option<String> {
    let id = project_id?;
    match catalogue.get_project(id).await {
        Ok(Some(project)) => Some(project.name),
        Ok(None) => Some(id.to_string()),
        Err(e) => {
            tracing::warn!(project_id = %id, error = %e, "project lookup failed");
            Some(id.to_string())
        }
    }
}
