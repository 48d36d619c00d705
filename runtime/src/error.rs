use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    UndefinedBlock(String),
    UndefinedParentBlock(String),
    /// `include_template` was given an empty destination.
    MissingDestination,
    Custom(String),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::UndefinedBlock(name) => write!(f, "call to undefined block '{}'", name),
            RuntimeError::UndefinedParentBlock(name) => {
                write!(f, "call to undefined parent block '{}'", name)
            }
            RuntimeError::MissingDestination => write!(f, "template file name was not specified"),
            RuntimeError::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RuntimeError {}
