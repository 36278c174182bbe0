//! Application error type.
//!
//! Every failure in the pipeline is fatal. The error carries a kind (which
//! stage/check fired) and the process exit code derived from it.

/// What went wrong, grouped by the stage that detected it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid CLI arguments or run configuration.
    Config,
    /// Local file I/O (exports, plot files, dataset JSON).
    Io,
    /// Network or HTTP error while reaching a source.
    Fetch,
    /// A post-parse sanity check failed: the source layout or content changed.
    SchemaIntegrity,
    /// A cell expected to be numeric, percent, or a known type failed to parse.
    TypeCoercion,
    /// Degenerate regression input or non-finite analysis output.
    Analysis,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Config | ErrorKind::Io => 2,
            ErrorKind::SchemaIntegrity | ErrorKind::TypeCoercion => 3,
            ErrorKind::Fetch => 4,
            ErrorKind::Analysis => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Config => "config error",
            ErrorKind::Io => "io error",
            ErrorKind::Fetch => "fetch failure",
            ErrorKind::SchemaIntegrity => "schema integrity failure",
            ErrorKind::TypeCoercion => "type coercion failure",
            ErrorKind::Analysis => "analysis error",
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn fetch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Fetch, message)
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SchemaIntegrity, message)
    }

    pub fn coercion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeCoercion, message)
    }

    pub fn analysis(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Analysis, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("exit_code", &self.exit_code())
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_kind() {
        assert_eq!(AppError::config("x").exit_code(), 2);
        assert_eq!(AppError::integrity("x").exit_code(), 3);
        assert_eq!(AppError::coercion("x").exit_code(), 3);
        assert_eq!(AppError::fetch("x").exit_code(), 4);
        assert_eq!(AppError::analysis("x").exit_code(), 5);
    }

    #[test]
    fn display_names_the_failing_stage() {
        let err = AppError::integrity("Arceus total is 700, expected 720");
        assert_eq!(
            err.to_string(),
            "schema integrity failure: Arceus total is 700, expected 720"
        );
    }
}
