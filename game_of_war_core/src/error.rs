use std::fmt;

/// Why a new game could not be set up. The previous game, if any, is left as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// The deck provider could not be reached or read.
    Fetch(String),
    /// The provider answered with something that is not a deck.
    Malformed(String),
    /// A game needs exactly one full deck.
    WrongCardCount { expected: usize, found: usize },
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SetupError::Fetch(reason) => write!(f, "could not fetch a deck: {}", reason),
            SetupError::Malformed(reason) => write!(f, "deck provider sent a malformed deck: {}", reason),
            SetupError::WrongCardCount { expected, found } => {
                write!(f, "expected {} cards from the deck provider, got {}", expected, found)
            }
        }
    }
}

impl std::error::Error for SetupError {}

impl From<std::io::Error> for SetupError {
    fn from(err: std::io::Error) -> Self {
        SetupError::Fetch(err.to_string())
    }
}

impl From<serde_json::Error> for SetupError {
    fn from(err: serde_json::Error) -> Self {
        SetupError::Malformed(err.to_string())
    }
}
