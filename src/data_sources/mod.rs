pub mod endpoint_type;
pub mod endpoint_types;

use std::time::Duration;

use crate::error::ProviderError;

pub use endpoint_type::EndpointTypeDataSource;
pub use endpoint_types::EndpointTypesDataSource;

pub const READ_TIMEOUT: Duration = Duration::from_secs(5 * 60);

async fn within<T, F>(fut: F) -> Result<T, ProviderError>
where
    F: std::future::Future<Output = Result<T, ProviderError>>,
{
    tokio::time::timeout(READ_TIMEOUT, fut)
        .await
        .map_err(|_| ProviderError::Timeout {
            operation: "read".to_string(),
            after: READ_TIMEOUT,
        })?
}
