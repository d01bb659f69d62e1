pub mod executor;
pub mod failure;

pub use executor::DelegationExecutor;
pub use failure::{
    FailureDecision, FailureHandler, PropagateFailure, RerouteHandler, RetryHandler, RetryPolicy,
};
