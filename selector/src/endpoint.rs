use thiserror::Error;

/// Raised when an endpoint record does not expose a metadata field.
///
/// A single unreadable endpoint never aborts a call: the filter logs it and
/// drops that endpoint from consideration.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("endpoint metadata field `{0}` is unreadable")]
    Unreadable(&'static str),
}

/// Read access to the cohort-relevant metadata of one provider endpoint.
///
/// Implemented by the transport-integration layer over whatever record the
/// RPC framework hands out. The selector only ever reads these two fields;
/// it never mutates or retains endpoints.
pub trait EndpointInfo {
    /// Name of the application that owns this endpoint.
    fn application(&self) -> Result<&str, MetadataError>;

    /// Cohort tag of this endpoint. Empty means the stable cohort; anything
    /// else is the name of a canary group.
    fn group_tag(&self) -> Result<&str, MetadataError>;
}

/// Endpoint record with eagerly materialized metadata.
///
/// Suitable for adapters that can extract both fields up front, and for
/// tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticEndpoint {
    pub application: String,
    pub group_tag: String,
}

impl StaticEndpoint {
    pub fn new<A, G>(application: A, group_tag: G) -> Self
    where
        A: Into<String>,
        G: Into<String>,
    {
        StaticEndpoint {
            application: application.into(),
            group_tag: group_tag.into(),
        }
    }
}

impl EndpointInfo for StaticEndpoint {
    fn application(&self) -> Result<&str, MetadataError> {
        Ok(&self.application)
    }

    fn group_tag(&self) -> Result<&str, MetadataError> {
        Ok(&self.group_tag)
    }
}
