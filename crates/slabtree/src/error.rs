//! Error types for slabtree operations

use crate::memory::PoolKind;

/// Result type alias for slabtree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for slabtree operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A pool's free list is empty
    #[error("Arena pool exhausted: no free {pool} slot")]
    Exhausted {
        /// Pool that ran dry
        pool: PoolKind,
    },

    /// A string buffer was requested larger than the largest size class
    #[error("Requested capacity {requested} exceeds the largest size class ({max} bytes)")]
    CapacityTooLarge {
        /// Requested capacity in bytes
        requested: usize,
        /// Capacity of the largest size class
        max: usize,
    },

    /// Malformed JSON input
    #[error("Invalid JSON syntax at position {position}: {kind}")]
    Json {
        /// Byte offset in the input where parsing stopped
        position: usize,
        /// What went wrong
        kind: JsonErrorKind,
    },

    /// Malformed XML input
    #[error("Invalid XML syntax at position {position}: {kind}")]
    Xml {
        /// Byte offset in the input where parsing stopped
        position: usize,
        /// What went wrong
        kind: XmlErrorKind,
    },

    /// Input nesting exceeds the configured limit
    #[error("Nesting depth {depth} exceeds maximum allowed {max}")]
    TooDeep {
        /// Depth that would have been entered
        depth: usize,
        /// Configured maximum
        max: usize,
    },

    /// Path parse or navigation failure
    #[error("Path error at '{path}': {kind}")]
    Path {
        /// The path as given by the caller
        path: String,
        /// What went wrong
        kind: PathErrorKind,
    },

    /// Operation applied to a node of the wrong kind
    #[error("Expected {expected} node, found {found}")]
    WrongKind {
        /// Kind the operation needs
        expected: &'static str,
        /// Kind the node actually has
        found: &'static str,
    },

    /// Corrupt buffer state detected before use
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Distinct JSON syntax failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JsonErrorKind {
    /// Zero-length input
    #[error("empty input")]
    EmptyInput,
    /// Input ended where more was required
    #[error("unexpected end of input")]
    UnexpectedEnd,
    /// String without closing quote
    #[error("unterminated string")]
    UnterminatedString,
    /// Object key that is not a string
    #[error("object keys must be strings")]
    NonStringKey,
    /// Missing ':' after an object key
    #[error("expected ':' after object key")]
    ExpectedColon,
    /// Missing ',' or closing bracket between elements
    #[error("expected ',' or '{closing}'")]
    ExpectedCommaOrEnd {
        /// Bracket that would have closed the container
        closing: char,
    },
    /// Non-whitespace after the top-level value
    #[error("trailing characters after value")]
    TrailingCharacters,
    /// Empty bare token where a value was expected
    #[error("invalid value")]
    InvalidValue,
}

/// Distinct XML syntax failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum XmlErrorKind {
    /// Zero-length input
    #[error("empty input")]
    EmptyInput,
    /// Input ended inside an element
    #[error("unexpected end of input")]
    UnexpectedEnd,
    /// Tag name does not start with a letter or '_'
    #[error("invalid tag name")]
    InvalidTagName,
    /// Something other than '>' or '/>' after a tag name
    #[error("expected '>' (attributes are not supported)")]
    ExpectedTagEnd,
    /// Closing tag does not match the opening tag
    #[error("closing tag </{found}> does not match <{expected}>")]
    TagMismatch {
        /// Opening tag name
        expected: String,
        /// Closing tag name actually found
        found: String,
    },
    /// Element holds both text and child elements
    #[error("mixed text and element content in <{tag}>")]
    MixedContent {
        /// Element with mixed content
        tag: String,
    },
    /// `<!--` without `-->`
    #[error("unterminated comment")]
    UnterminatedComment,
    /// `<![CDATA[` without `]]>`
    #[error("unterminated CDATA section")]
    UnterminatedCdata,
    /// `<?` or `<!` without a closing '>'
    #[error("unterminated declaration")]
    UnterminatedDeclaration,
}

/// Path parse and navigation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathErrorKind {
    /// Path text does not follow the `a.b[2].c` grammar
    #[error("malformed path: {0}")]
    Malformed(&'static str),
    /// No member with this key
    #[error("key '{0}' not found")]
    KeyNotFound(String),
    /// Index past the end of the container
    #[error("index {index} out of range (length {len})")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Container length
        len: usize,
    },
    /// Segment applied to a leaf or null
    #[error("segment cannot be applied to {0} node")]
    NotAContainer(&'static str),
    /// Target exists but does not hold the requested scalar
    #[error("value is not a valid {0}")]
    TypeMismatch(&'static str),
}

impl Error {
    /// Create a JSON syntax error
    pub fn json(position: usize, kind: JsonErrorKind) -> Self {
        Self::Json { position, kind }
    }

    /// Create an XML syntax error
    pub fn xml(position: usize, kind: XmlErrorKind) -> Self {
        Self::Xml { position, kind }
    }

    /// Create a path error
    pub fn path(path: impl Into<String>, kind: PathErrorKind) -> Self {
        Self::Path {
            path: path.into(),
            kind,
        }
    }

    /// Create an integrity error
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error came from malformed input text
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Json { .. } | Self::Xml { .. })
    }

    /// Whether this error is an arena allocation failure
    pub fn is_allocation(&self) -> bool {
        matches!(self, Self::Exhausted { .. } | Self::CapacityTooLarge { .. })
    }
}
