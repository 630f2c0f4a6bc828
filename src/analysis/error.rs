use thiserror::Error;
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("channel index {index} out of range (recording has {count} channels)")]
    ChannelOutOfRange { index: usize, count: usize },
    #[error("min_scale must be at least {floor} samples, got {min_scale}")]
    ScaleBelowFloor { min_scale: usize, floor: usize },
    #[error("min_scale ({min_scale}) must be below max_scale ({max_scale})")]
    InvalidScaleRange { min_scale: usize, max_scale: usize },
    #[error("at least 2 scales are required, got {0}")]
    TooFewScales(usize),
    #[error("invalid band `{name}`: {reason}")]
    InvalidBand { name: String, reason: String },
    #[error("failed to render plot: {0}")]
    Plot(String),
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for AnalysisError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        AnalysisError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for AnalysisError {
    fn from(value: image::ImageError) -> Self {
        AnalysisError::Plot(value.to_string())
    }
}
