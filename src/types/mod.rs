// ABOUTME: Validated domain types shared by the reconciler and the pipeline.
// ABOUTME: Port and name types with their parsing rules.

mod name;
mod port_spec;
mod service_port;
mod workload_name;

pub use name::{BackendName, FrontendName, ProbeName, ResourceName};
pub use port_spec::{ParsePortSpecError, PortSpec};
pub use service_port::{ParseServicePortError, Protocol, ServicePort};
pub use workload_name::{WorkloadName, WorkloadNameError};
