#[derive(Debug, Clone, PartialEq)]
pub enum TrackerError {
    /// Reconciliation needs absolute coordinates; the map has not reported its size yet.
    NotCalibrated,
    AlreadyCalibrated,
    InvalidMapSize { width: f64, height: f64 },
    InvalidCatalog(String),
}

impl std::fmt::Display for TrackerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerError::NotCalibrated => write!(f, "location registry is not calibrated"),
            TrackerError::AlreadyCalibrated => {
                write!(f, "location registry is already calibrated")
            }
            TrackerError::InvalidMapSize { width, height } => {
                write!(f, "invalid map size {}x{}", width, height)
            }
            TrackerError::InvalidCatalog(msg) => write!(f, "invalid location catalog: {}", msg),
        }
    }
}

impl std::error::Error for TrackerError {}
