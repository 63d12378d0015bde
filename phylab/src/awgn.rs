//! Complex additive white Gaussian noise channel.

use num_complex::Complex32;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{Error, Result};
use crate::units::db_to_lin;

/// Adds circularly-symmetric complex Gaussian noise `CN(0, no)`
#[derive(Clone, Copy, Debug, Default)]
pub struct AwgnChannel;

impl AwgnChannel {
    pub fn new() -> Self {
        Self
    }

    /// Noisy copy of `symbols`; each of I and Q gets variance `no / 2`
    pub fn apply<R: Rng>(&self, rng: &mut R, symbols: &[Complex32], no: f32) -> Result<Vec<Complex32>> {
        if !(no.is_finite() && no >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "noise variance must be finite and non-negative, got {no}"
            )));
        }
        let per_dim = Normal::new(0.0f32, (no / 2.0).sqrt())
            .map_err(|e| Error::InvalidConfig(format!("noise variance: {e}")))?;

        Ok(symbols
            .iter()
            .map(|&s| s + Complex32::new(per_dim.sample(rng), per_dim.sample(rng)))
            .collect())
    }
}

/// Noise variance for a target Eb/N0
///
/// `es` is the average symbol energy, `coderate` the fraction of information
/// bits per coded bit.
pub fn ebno_to_no(ebno_db: f32, es: f32, bits_per_symbol: usize, coderate: f32) -> f32 {
    let eb = es / (bits_per_symbol as f32 * coderate);
    eb / db_to_lin(ebno_db)
}

/// Fraction of positions where `a` and `b` differ
pub fn bit_error_rate(a: &[u8], b: &[u8]) -> f32 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let errors = a.iter().zip(b).filter(|(x, y)| x != y).count();
    errors as f32 / n as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{average_energy, Mapper};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_zero_noise_is_identity() {
        let mut rng = StdRng::seed_from_u64(1);
        let symbols = vec![Complex32::new(0.5, -0.5); 16];

        let rx = AwgnChannel::new().apply(&mut rng, &symbols, 0.0).unwrap();
        assert_eq!(rx, symbols);
    }

    #[test]
    fn test_noise_power() {
        let mut rng = StdRng::seed_from_u64(2);
        let zeros = vec![Complex32::new(0.0, 0.0); 20_000];

        let rx = AwgnChannel::new().apply(&mut rng, &zeros, 0.1).unwrap();
        let power = average_energy(&rx);
        assert!((power - 0.1).abs() < 0.005, "noise power {}", power);
    }

    #[test]
    fn test_negative_noise_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(AwgnChannel::new().apply(&mut rng, &[], -1.0).is_err());
    }

    #[test]
    fn test_ebno_to_no() {
        // Unit-energy QPSK, uncoded: Eb = 0.5
        let no = ebno_to_no(10.0, 1.0, 2, 1.0);
        assert!((no - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_qpsk_ber_at_high_ebno() {
        let mut rng = StdRng::seed_from_u64(4);
        let mapper = Mapper::qam(2).unwrap();
        let bits: Vec<u8> = (0..2048).map(|_| rng.gen_range(0..2)).collect();

        let tx = mapper.map(&bits).unwrap();
        let no = ebno_to_no(10.0, average_energy(&tx), 2, 1.0);
        let rx = AwgnChannel::new().apply(&mut rng, &tx, no).unwrap();

        // Theoretical QPSK BER at 10 dB is ~4e-6
        assert!(bit_error_rate(&bits, &mapper.demap_hard(&rx)) < 0.002);
        assert_eq!(bit_error_rate(&bits, &bits), 0.0);
    }
}
