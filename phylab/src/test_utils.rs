/// Tensor testing utilities
///
/// Comparisons run as tensor operations (difference, abs, max) and only
/// read back the final scalar for the assertion.

use burn::tensor::{backend::Backend, ElementConversion, Tensor};

/// CPU backend used by unit and integration tests
pub type TestBackend = burn::backend::NdArray;

/// Assert two tensors are element-wise approximately equal
pub fn assert_approx_eq_tensor<B: Backend, const D: usize>(
    a: &Tensor<B, D>,
    b: &Tensor<B, D>,
    epsilon: f32,
    msg: &str,
) {
    assert_eq!(a.dims(), b.dims(), "{}: shape mismatch", msg);

    let diff = (a.clone() - b.clone()).abs();
    let max_diff: f32 = diff.max().into_scalar().elem();

    assert!(
        max_diff < epsilon,
        "{}: max difference {:.6} >= epsilon {:.6}",
        msg,
        max_diff,
        epsilon
    );
}

/// Assert every element of a tensor approximately equals `expected`
pub fn assert_all_close_to<B: Backend, const D: usize>(
    tensor: &Tensor<B, D>,
    expected: f32,
    epsilon: f32,
    msg: &str,
) {
    let expected_tensor = Tensor::ones_like(tensor).mul_scalar(expected);
    assert_approx_eq_tensor(tensor, &expected_tensor, epsilon, msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq() {
        let device = Default::default();

        let a = Tensor::<TestBackend, 1>::from_floats([1.0, 2.0, 3.0], &device);
        let b = Tensor::<TestBackend, 1>::from_floats([1.001, 2.001, 2.999], &device);

        assert_approx_eq_tensor(&a, &b, 0.01, "should pass");
    }

    #[test]
    #[should_panic]
    fn test_approx_eq_fail() {
        let device = Default::default();

        let a = Tensor::<TestBackend, 1>::from_floats([1.0, 2.0, 3.0], &device);
        let b = Tensor::<TestBackend, 1>::from_floats([1.0, 2.1, 3.0], &device);

        assert_approx_eq_tensor(&a, &b, 0.01, "should fail");
    }

    #[test]
    fn test_all_close_to() {
        let device = Default::default();
        let t = Tensor::<TestBackend, 2>::ones([3, 4], &device).mul_scalar(2.5);
        assert_all_close_to(&t, 2.5, 1e-6, "constant tensor");
    }
}
