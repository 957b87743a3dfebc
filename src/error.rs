use thiserror::Error;

/// Malformed input. A layout call that fails produces no partial output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("duplicate person id `{id}`")]
    DuplicateId { id: String },
    #[error("relationship `{from}` -> `{to}` references unknown person `{missing}`")]
    DanglingReference {
        from: String,
        to: String,
        missing: String,
    },
}

/// Text notation errors; `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: unknown partner status `{status}`")]
    UnknownStatus { line: usize, status: String },
    #[error("line {line}: unknown style flag `{flag}`")]
    UnknownStyle { line: usize, flag: String },
    #[error("line {line}: cannot parse `{text}`")]
    UnrecognizedLine { line: usize, text: String },
}
