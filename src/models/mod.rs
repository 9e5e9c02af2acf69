pub mod endpoint;
pub mod endpoint_type;
pub mod project;

pub use endpoint::{EndpointAuthorization, ServiceEndpoint, OWNER_LIBRARY};
pub use endpoint_type::{
    AuthenticationScheme, InputDescriptor, InputValues, ListResponse, ServiceEndpointType,
};
pub use project::{Project, ProjectReference, ServiceEndpointProjectReference};
