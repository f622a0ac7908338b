//! Provider-facing descriptors (endpoints, scopes) and the upstream resource catalog.
//!
//! `descriptor` exposes validated metadata ([`ProviderDescriptor`]) covering the
//! authorization, token, and data API endpoints plus the scopes requested during
//! authorization. `resource` names the five WHOOP datasets the broker proxies.

pub mod descriptor;
pub mod resource;

pub use descriptor::*;
pub use resource::*;
