use thiserror::Error;

#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Error)]
#[error("ParseError: {message} at position {position}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: &str, position: usize) -> ParseError {
        ParseError {
            message: message.to_string(),
            position,
        }
    }
}
