use crate::dto::HealthRes;

/// Simple health service for the knowledge-base API
///
/// Reports liveness only; it does not touch the collection file.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Static method to check health without creating an instance
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Knowledge base is alive".into(),
        }
    }
}
