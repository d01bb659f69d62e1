//! service_request_create tool — open a repair ticket in the CRM.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use omra_core::Tool;

use crate::crm::{CrmClient, NewServiceRequest};

pub struct ServiceRequestCreateTool {
    crm: Arc<CrmClient>,
}

impl ServiceRequestCreateTool {
    pub fn new(crm: Arc<CrmClient>) -> Self {
        Self { crm }
    }
}

#[async_trait]
impl Tool for ServiceRequestCreateTool {
    fn name(&self) -> &str {
        "service_request_create"
    }

    fn description(&self) -> &str {
        "Create a service request for a customer's appliance in the CRM"
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "customer_id": {
                    "type": "integer",
                    "description": "CRM id of the customer"
                },
                "appliance_id": {
                    "type": "integer",
                    "description": "CRM id of the appliance to service"
                },
                "issue_description": {
                    "type": "string",
                    "description": "What is wrong with the appliance"
                },
                "priority": {
                    "type": "string",
                    "enum": ["low", "medium", "high", "urgent"],
                    "default": "medium"
                }
            },
            "required": ["customer_id", "appliance_id", "issue_description"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String> {
        let request: NewServiceRequest = serde_json::from_value(args)?;
        let created = self.crm.create_service_request(&request).await?;
        Ok(serde_json::to_string(&created)?)
    }
}
