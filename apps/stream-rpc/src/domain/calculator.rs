//! Calculator primitives.

use super::status::CallError;

/// Add two `i32` values.
///
/// # Errors
///
/// Returns `InvalidArgument` when the result does not fit in `i32`.
pub fn sum(first: i32, second: i32) -> Result<i32, CallError> {
    first.checked_add(second).ok_or_else(|| {
        CallError::invalid_argument(
            "second_number",
            format!("{first} + {second} overflows a 32-bit integer"),
        )
    })
}

/// Square root of a non-negative integer.
///
/// # Errors
///
/// Returns `InvalidArgument` for negative input.
pub fn square_root(number: i32) -> Result<f64, CallError> {
    if number < 0 {
        return Err(CallError::invalid_argument(
            "number",
            format!("Received a negative number: {number}"),
        ));
    }
    Ok(f64::from(number).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::status::StatusCode;

    #[test]
    fn sums() {
        assert_eq!(sum(3, 10).unwrap(), 13);
        assert_eq!(sum(-4, 4).unwrap(), 0);
    }

    #[test]
    fn sum_overflow_is_invalid_argument() {
        assert_eq!(
            sum(i32::MAX, 1).unwrap_err().code(),
            StatusCode::InvalidArgument
        );
    }

    #[test]
    fn square_roots() {
        assert!((square_root(10).unwrap() - 3.162_277_660_168_379_5).abs() < 1e-12);
        assert!(square_root(0).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn negative_square_root_is_rejected() {
        let err = square_root(-2).unwrap_err();
        assert_eq!(err.code(), StatusCode::InvalidArgument);
        assert_eq!(err.to_string(), "Received a negative number: -2");
    }
}
