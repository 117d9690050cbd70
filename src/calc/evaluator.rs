//! Evaluator Module
//!
//! Pure mapping from a calculation request to a numeric result or a typed
//! failure. Deterministic, side-effect free and safe to call concurrently.

use crate::calc::{parser, CalculationRequest, Operator, MAX_EXPRESSION_LENGTH};
use crate::error::{CalcError, Result};

// == Evaluate ==
/// Evaluates a calculation request.
///
/// Arity rules for the structured form:
/// - `add` and `multiply` fold two or more operands left to right
/// - `subtract` and `divide` take exactly two operands
///
/// All operands must be finite, non-NaN numbers. Arithmetic follows
/// IEEE-754 f64 semantics; a zero divisor fails with `DivisionByZero`.
pub fn evaluate(request: &CalculationRequest) -> Result<f64> {
    match request {
        CalculationRequest::Operation { op, operands } => {
            for operand in operands {
                if !operand.is_finite() {
                    return Err(CalcError::InvalidOperand(format!(
                        "operand {} is not a finite number",
                        operand
                    )));
                }
            }
            match op {
                Operator::Add => {
                    require_at_least(op, operands, 2)?;
                    Ok(operands.iter().sum())
                }
                Operator::Multiply => {
                    require_at_least(op, operands, 2)?;
                    Ok(operands.iter().product())
                }
                Operator::Subtract => {
                    require_exactly(op, operands, 2)?;
                    Ok(operands[0] - operands[1])
                }
                Operator::Divide => {
                    require_exactly(op, operands, 2)?;
                    if operands[1] == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    Ok(operands[0] / operands[1])
                }
            }
        }
        CalculationRequest::Expression(text) => {
            if text.len() > MAX_EXPRESSION_LENGTH {
                return Err(CalcError::Parse(format!(
                    "expression exceeds maximum length of {} bytes",
                    MAX_EXPRESSION_LENGTH
                )));
            }
            parser::parse(text)
        }
    }
}

fn require_exactly(op: &Operator, operands: &[f64], count: usize) -> Result<()> {
    if operands.len() != count {
        return Err(CalcError::Arity(format!(
            "'{}' takes exactly {} operands, got {}",
            op.token(),
            count,
            operands.len()
        )));
    }
    Ok(())
}

fn require_at_least(op: &Operator, operands: &[f64], count: usize) -> Result<()> {
    if operands.len() < count {
        return Err(CalcError::Arity(format!(
            "'{}' takes at least {} operands, got {}",
            op.token(),
            count,
            operands.len()
        )));
    }
    Ok(())
}
