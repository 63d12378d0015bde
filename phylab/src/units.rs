use burn::tensor::{backend::Backend, Tensor};
use std::f32::consts::LN_10;

/// Converts decibels to linear power ratio
pub fn db_to_lin(db: f32) -> f32 {
    (db * LN_10 / 10.0).exp()
}

/// Converts linear power ratio to decibels
pub fn lin_to_db(lin: f32) -> f32 {
    10.0 * lin.log10()
}

/// Element-wise dB -> linear on the backend
///
/// Uses `exp(x ln10 / 10)` so that 0 dB maps to exactly 1.0
pub fn db_to_lin_tensor<B: Backend, const D: usize>(db: Tensor<B, D>) -> Tensor<B, D> {
    db.mul_scalar(LN_10 / 10.0).exp()
}

/// Element-wise linear -> dB on the backend
pub fn lin_to_db_tensor<B: Backend, const D: usize>(lin: Tensor<B, D>) -> Tensor<B, D> {
    lin.log().mul_scalar(10.0 / LN_10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_approx_eq_tensor, TestBackend};

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(db_to_lin(0.0), 1.0);
        assert!((db_to_lin(10.0) - 10.0).abs() < 1e-4);
        assert!((db_to_lin(-3.0) - 0.501_187).abs() < 1e-5);
        assert!((lin_to_db(100.0) - 20.0).abs() < 1e-5);
    }

    #[test]
    fn test_tensor_conversions() {
        let device = Default::default();
        let db = Tensor::<TestBackend, 1>::from_floats([-10.0, 0.0, 3.0, 20.0], &device);

        let lin = db_to_lin_tensor(db.clone());
        let expected = Tensor::<TestBackend, 1>::from_floats([0.1, 1.0, 1.995_262, 100.0], &device);
        assert_approx_eq_tensor(&lin, &expected, 1e-3, "db_to_lin");

        let back = lin_to_db_tensor(lin);
        assert_approx_eq_tensor(&back, &db, 1e-4, "lin_to_db");
    }
}
