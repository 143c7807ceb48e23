use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("property \"{name}\" is not registered for this type")]
    UnknownProperty { name: String },

    #[error("property \"{name}\" already registered as {existing}, requested {requested}")]
    Conflict {
        name: String,
        existing: &'static str,
        requested: &'static str,
    },

    #[error("expected a JSON value of kind {expected}")]
    KindMismatch { expected: &'static str },

    #[error("expected a JSON object")]
    NotAnObject,
}
