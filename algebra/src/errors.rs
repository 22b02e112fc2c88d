use ark_std::{error, fmt};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum AlgebraError {
    DeserializationError,
    SerializationError,
    ParameterError,
    GroupInversionError,
    DomainSizeError,
}

impl fmt::Display for AlgebraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use AlgebraError::*;
        f.write_str(match self {
            DeserializationError => "Could not deserialize object",
            SerializationError => "Could not serialize object",
            ParameterError => "Unexpected parameter for method or function",
            GroupInversionError => "Group Element not invertible",
            DomainSizeError => "Evaluation domain size is not a supported power of two",
        })
    }
}

impl error::Error for AlgebraError {}
