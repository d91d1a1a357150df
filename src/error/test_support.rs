use super::{ControlError, ValidationError};

impl From<&'static str> for ValidationError {
    fn from(message: &'static str) -> Self {
        ValidationError::TestExpectation { message }
    }
}

impl From<String> for ValidationError {
    fn from(value: String) -> Self {
        ValidationError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for ControlError {
    fn from(message: &'static str) -> Self {
        ControlError::TestExpectation { message }
    }
}

impl From<String> for ControlError {
    fn from(value: String) -> Self {
        ControlError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}
