//! CRM REST client — the concrete binding behind the agent tools.
//!
//! Talks to the documented OMRA backend endpoints: `POST /auth/login` for a
//! bearer token, `/api/customers` for lookups, `/api/service-requests` for
//! ticket creation.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// A customer record as returned by the CRM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

/// Payload for creating a service request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewServiceRequest {
    pub customer_id: i64,
    pub appliance_id: i64,
    pub issue_description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: Status,
}

/// A service request as returned by the CRM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: i64,
    pub customer_id: i64,
    pub appliance_id: i64,
    pub issue_description: String,
    pub priority: Priority,
    pub status: Status,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
}

/// Authenticated client for the CRM REST API.
pub struct CrmClient {
    http: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl CrmClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        }
    }

    /// Authenticate and cache the bearer token for subsequent calls.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let url = format!("{}/auth/login", self.base_url);
        let resp = self
            .http
            .post(&url)
            .form(&[("username", email), ("password", password)])
            .send()
            .await
            .with_context(|| format!("login request to {url} failed"))?
            .error_for_status()
            .context("login rejected")?;

        let body: LoginResponse = resp.json().await.context("malformed login response")?;
        *self.token.write().await = Some(body.access_token);
        info!(url = %url, "Authenticated against CRM");
        Ok(())
    }

    async fn bearer(&self) -> Result<String> {
        self.token
            .read()
            .await
            .clone()
            .context("not authenticated; call login() first")
    }

    /// Search customers by name or email fragment.
    pub async fn list_customers(
        &self,
        search: Option<&str>,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<Customer>> {
        let url = format!("{}/api/customers", self.base_url);
        let mut req = self
            .http
            .get(&url)
            .bearer_auth(self.bearer().await?)
            .query(&[("skip", skip.to_string()), ("limit", limit.to_string())]);
        if let Some(q) = search {
            req = req.query(&[("search", q)]);
        }
        let customers = req
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?
            .error_for_status()?
            .json()
            .await
            .context("malformed customer list")?;
        debug!(url = %url, search = ?search, "Listed customers");
        Ok(customers)
    }

    pub async fn get_customer(&self, id: i64) -> Result<Customer> {
        let url = format!("{}/api/customers/{id}", self.base_url);
        self.http
            .get(&url)
            .bearer_auth(self.bearer().await?)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?
            .error_for_status()
            .with_context(|| format!("customer {id} not found"))?
            .json()
            .await
            .context("malformed customer record")
    }

    pub async fn create_service_request(
        &self,
        request: &NewServiceRequest,
    ) -> Result<ServiceRequest> {
        let url = format!("{}/api/service-requests", self.base_url);
        let created: ServiceRequest = self
            .http
            .post(&url)
            .bearer_auth(self.bearer().await?)
            .json(request)
            .send()
            .await
            .with_context(|| format!("POST {url} failed"))?
            .error_for_status()
            .context("service request rejected")?
            .json()
            .await
            .context("malformed service request response")?;
        info!(id = created.id, customer = created.customer_id, "Created service request");
        Ok(created)
    }
}
