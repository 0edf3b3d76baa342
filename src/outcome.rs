//! Successful results of an executor call

/// What a successful call produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome<T> {
    /// Payload decoded into the endpoint's response type
    Success(T),

    /// Server answered with the no-content status and the response type accepts it
    NoContent,
}

impl<T> Outcome<T> {
    pub fn is_no_content(&self) -> bool {
        matches!(self, Outcome::NoContent)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::NoContent => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::NoContent => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::NoContent => Outcome::NoContent,
        }
    }
}
