//! Calculator module
//!
//! Single-shot pure computation from (num1, num2, operation) to exactly one
//! of {result, error} plus the echoed inputs.

use serde::Serialize;

/// Soft-error message for division by zero
pub const DIVIDE_BY_ZERO: &str = "Cannot divide by zero";
/// Soft-error message for an unrecognized operation
pub const INVALID_OPERATION: &str = "Invalid operation. Use: add, subtract, multiply, divide";

/// Supported arithmetic operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    /// Case-insensitive parse; `None` for anything outside the four operations
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "add" => Some(Self::Add),
            "subtract" => Some(Self::Subtract),
            "multiply" => Some(Self::Multiply),
            "divide" => Some(Self::Divide),
            _ => None,
        }
    }
}

/// Numeric result: integer for add/subtract/multiply, float for divide
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CalcValue {
    Int(i64),
    Float(f64),
}

/// Calculation response. `result` and `error` are mutually exclusive;
/// the absent one is omitted from the serialized output.
#[derive(Debug, Serialize)]
pub struct CalculationResponse {
    pub num1: i64,
    pub num2: i64,
    /// Echoed as received, not normalized to lowercase
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CalcValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

/// Dispatch on the normalized operation and produce the response
#[allow(clippy::cast_precision_loss)]
pub fn calculate(num1: i64, num2: i64, operation: &str) -> CalculationResponse {
    let (result, error) = match Operation::parse(operation) {
        Some(Operation::Add) => (Some(CalcValue::Int(num1.wrapping_add(num2))), None),
        Some(Operation::Subtract) => (Some(CalcValue::Int(num1.wrapping_sub(num2))), None),
        Some(Operation::Multiply) => (Some(CalcValue::Int(num1.wrapping_mul(num2))), None),
        Some(Operation::Divide) => {
            if num2 == 0 {
                (None, Some(DIVIDE_BY_ZERO))
            } else {
                // Floating-point quotient, not integer division
                (Some(CalcValue::Float(num1 as f64 / num2 as f64)), None)
            }
        }
        None => (None, Some(INVALID_OPERATION)),
    };

    CalculationResponse {
        num1,
        num2,
        operation: operation.to_string(),
        result,
        error,
    }
}
