use std::{
    error::Error,
    fmt::{Debug, Display, Formatter},
};

pub enum SnapFetchError {
    /// A date or time shorthand that fits none of the recognized shapes.
    MalformedInput(String),
    Parse(String),
    Http(String),
    Storage(String),
}

impl SnapFetchError {
    pub fn malformed(kind: &str, input: &str) -> Self {
        SnapFetchError::MalformedInput(format!("unrecognized {} input: {:?}", kind, input))
    }

    fn message(&self) -> &str {
        match self {
            SnapFetchError::MalformedInput(msg)
            | SnapFetchError::Parse(msg)
            | SnapFetchError::Http(msg)
            | SnapFetchError::Storage(msg) => msg,
        }
    }
}

impl Debug for SnapFetchError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        let kind = match self {
            SnapFetchError::MalformedInput(_) => "MalformedInput",
            SnapFetchError::Parse(_) => "Parse",
            SnapFetchError::Http(_) => "Http",
            SnapFetchError::Storage(_) => "Storage",
        };
        write!(f, "{}({})", kind, self.message())
    }
}

impl Display for SnapFetchError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.message())
    }
}

impl Error for SnapFetchError {}
