pub type UbeResult<T> = Result<T, UbeError>;

#[derive(thiserror::Error, Debug)]
pub enum UbeError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("mask painted no pixels, region is empty")]
    EmptyRegion,

    #[error("surface not loaded: {0}")]
    SurfaceNotLoaded(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl UbeError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn dimension_mismatch(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch(msg.into())
    }

    pub fn not_loaded(msg: impl Into<String>) -> Self {
        Self::SurfaceNotLoaded(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            UbeError::invalid_argument("x")
                .to_string()
                .contains("invalid argument:")
        );
        assert!(
            UbeError::dimension_mismatch("x")
                .to_string()
                .contains("dimension mismatch:")
        );
        assert!(
            UbeError::not_loaded("x")
                .to_string()
                .contains("surface not loaded:")
        );
        assert!(UbeError::EmptyRegion.to_string().contains("empty"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = UbeError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
