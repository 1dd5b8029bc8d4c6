/// Configuration for a progress indicator operation
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Operation name (e.g., "Downloading")
    pub operation: String,

    /// Context-specific message, usually the archive name
    pub context: String,

    /// Total units for determinate operations (None for a spinner)
    pub total: Option<u64>,

    pub style: ProgressStyle,
}

impl ProgressConfig {
    pub fn new(
        operation: impl Into<String>,
        context: impl Into<String>,
        style: ProgressStyle,
    ) -> Self {
        Self {
            operation: operation.into(),
            context: context.into(),
            total: None,
            style,
        }
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }
}

/// Progress display style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressStyle {
    /// Byte counts with throughput (downloads)
    Bytes,
    /// Plain counts
    #[default]
    Count,
}

impl std::fmt::Display for ProgressStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes => write!(f, "bytes"),
            Self::Count => write!(f, "count"),
        }
    }
}
