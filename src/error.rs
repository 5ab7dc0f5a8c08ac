use crate::geodesy::GeodesicError;
use crate::projection::ProjectionError;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OverlayError {
    #[error("invalid overlay parameters: {reason}")]
    InvalidParams { reason: String },
    #[error("geodesic computation failed on bearing {bearing}°: {source}")]
    GeodesicFailure {
        bearing: f64,
        #[source]
        source: GeodesicError,
    },
    #[error("projection failed: {0}")]
    ProjectionFailure(#[from] ProjectionError),
    #[error("layer attribute `{0}` is missing")]
    MissingAttribute(String),
    #[error("layer attribute `{key}` has invalid value `{value}`")]
    InvalidAttribute { key: String, value: String },
}

impl OverlayError {
    pub(crate) fn invalid_params(reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            reason: reason.into(),
        }
    }

    pub(crate) fn geodesic(bearing: f64) -> impl FnOnce(GeodesicError) -> Self {
        move |source| Self::GeodesicFailure { bearing, source }
    }
}
