use thiserror::Error;

/// Failures while getting a video into an ACTIVE remote state.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Remote processing failed for {name}")]
    ProcessingFailed { name: String },

    #[error("Remote processing did not finish after {polls} status checks")]
    ProcessingTimeout { polls: u32 },
}

/// Why the provider returned no usable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    /// Safety filters or a blocklist stopped the prompt or the answer
    Safety(String),
    /// Output hit the token ceiling before any text was produced
    MaxLength,
    /// Anything else the provider reported
    Other(String),
    /// Empty response with no classification at all
    Unknown,
}

impl BlockReason {
    /// Map the provider's finish/block code onto a reason.
    pub fn from_provider(code: &str) -> Self {
        match code {
            "SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" | "IMAGE_SAFETY" | "OTHER_SAFETY" => {
                BlockReason::Safety(code.to_string())
            }
            "MAX_TOKENS" => BlockReason::MaxLength,
            "" | "FINISH_REASON_UNSPECIFIED" | "BLOCK_REASON_UNSPECIFIED" => BlockReason::Unknown,
            other => BlockReason::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockReason::Safety(code) => write!(f, "blocked ({})", code),
            BlockReason::MaxLength => write!(f, "max length"),
            BlockReason::Other(code) => write!(f, "other ({})", code),
            BlockReason::Unknown => write!(f, "other"),
        }
    }
}

/// Terminal outcomes of a model call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    #[error("The model returned no text: {reason}")]
    Blocked { reason: BlockReason },

    #[error("The model is overloaded; gave up after {attempts} attempts")]
    Overloaded { attempts: u32 },

    #[error("Model request failed: {0}")]
    Fatal(String),
}

/// Why a subtitle track was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No subtitle text to validate")]
    EmptyInput,

    #[error("The model did not generate valid timestamps (no '-->' marker found)")]
    NoTimecodeMarker,

    #[error("Malformed subtitle track: {0}")]
    Parse(String),
}

/// Everything a core operation can surface to its caller.
#[derive(Error, Debug)]
pub enum WeltError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
