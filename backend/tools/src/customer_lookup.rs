//! customer_lookup tool — search the CRM for customers by name or email.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use omra_core::Tool;

use crate::crm::CrmClient;

#[derive(Debug, Deserialize)]
pub struct CustomerLookupInput {
    /// Name or email fragment to search for.
    pub query: String,
    /// Maximum matches to return (default 10).
    pub limit: Option<u32>,
}

pub struct CustomerLookupTool {
    crm: Arc<CrmClient>,
}

impl CustomerLookupTool {
    pub fn new(crm: Arc<CrmClient>) -> Self {
        Self { crm }
    }
}

#[async_trait]
impl Tool for CustomerLookupTool {
    fn name(&self) -> &str {
        "customer_lookup"
    }

    fn description(&self) -> &str {
        "Search CRM customers by name or email and return matching records"
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Name or email fragment to search for"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum matches to return",
                    "default": 10
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String> {
        let input: CustomerLookupInput = serde_json::from_value(args)?;
        let limit = input.limit.unwrap_or(10);
        let customers = self
            .crm
            .list_customers(Some(&input.query), 0, limit)
            .await?;
        Ok(serde_json::to_string(&customers)?)
    }
}
