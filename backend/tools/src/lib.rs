pub mod crm;
pub mod customer_lookup;
pub mod handler;
pub mod service_request;

use std::sync::Arc;

use omra_core::ToolRegistry;

pub use crm::{CrmClient, Customer, NewServiceRequest, Priority, ServiceRequest, Status};
pub use customer_lookup::CustomerLookupTool;
pub use handler::HttpTaskHandler;
pub use service_request::ServiceRequestCreateTool;

/// Register the CRM-backed tools on a registry.
pub fn register_crm_tools(registry: &mut ToolRegistry, crm: Arc<CrmClient>) {
    registry.register(Arc::new(CustomerLookupTool::new(crm.clone())));
    registry.register(Arc::new(ServiceRequestCreateTool::new(crm)));
}
