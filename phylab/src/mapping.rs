/// Square QAM mapping
///
/// Gray-coded M-QAM with `M = 2^k`, `k` even, normalised to unit average
/// symbol energy. Within a k-bit label the even-indexed bits select the
/// in-phase PAM level and the odd-indexed bits the quadrature level; each
/// axis uses the binary reflected Gray code, so nearest neighbours differ in
/// exactly one bit.

use num_complex::Complex32;

use crate::error::{Error, Result};

/// Constellation family of a [`Mapper`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstellationType {
    Qam,
}

#[derive(Clone, Debug)]
pub struct Mapper {
    constellation_type: ConstellationType,
    bits_per_symbol: usize,
    points: Vec<Complex32>,
}

/// Gray-coded PAM level for bits `b` (MSB first), values in {±1, ±3, ...}
fn pam_gray(bits: &[u8]) -> f32 {
    match bits {
        [] => 0.0,
        [b] => 1.0 - 2.0 * f32::from(*b),
        [b, rest @ ..] => {
            let sign = 1.0 - 2.0 * f32::from(*b);
            sign * ((1u32 << rest.len()) as f32 + pam_gray(rest))
        }
    }
}

/// Bits of `index`, MSB first
fn index_bits(index: usize, k: usize) -> Vec<u8> {
    (0..k).rev().map(|i| ((index >> i) & 1) as u8).collect()
}

impl Mapper {
    /// Square QAM with `bits_per_symbol` in {2, 4, 6, 8, 10}
    pub fn qam(bits_per_symbol: usize) -> Result<Self> {
        if bits_per_symbol == 0 || bits_per_symbol % 2 != 0 || bits_per_symbol > 10 {
            return Err(Error::InvalidConfig(format!(
                "QAM needs an even number of bits per symbol in 2..=10, got {bits_per_symbol}"
            )));
        }

        let order = 1usize << bits_per_symbol;
        let levels_per_axis = (1usize << (bits_per_symbol / 2)) as f32;
        // E|x|^2 of the unnormalised grid: 2 (L^2 - 1) / 3
        let scale = (2.0 * (levels_per_axis * levels_per_axis - 1.0) / 3.0).sqrt().recip();

        let points = (0..order)
            .map(|index| {
                let bits = index_bits(index, bits_per_symbol);
                let i_bits: Vec<u8> = bits.iter().step_by(2).copied().collect();
                let q_bits: Vec<u8> = bits.iter().skip(1).step_by(2).copied().collect();
                Complex32::new(pam_gray(&i_bits), pam_gray(&q_bits)) * scale
            })
            .collect();

        Ok(Self {
            constellation_type: ConstellationType::Qam,
            bits_per_symbol,
            points,
        })
    }

    pub fn constellation_type(&self) -> ConstellationType {
        self.constellation_type
    }

    pub fn bits_per_symbol(&self) -> usize {
        self.bits_per_symbol
    }

    /// Constellation points indexed by their bit label
    pub fn points(&self) -> &[Complex32] {
        &self.points
    }

    /// Maps bits (0/1, MSB first per symbol) to symbols
    pub fn map(&self, bits: &[u8]) -> Result<Vec<Complex32>> {
        let k = self.bits_per_symbol;
        if bits.len() % k != 0 {
            return Err(Error::InvalidConfig(format!(
                "{} bits is not a multiple of {} bits per symbol",
                bits.len(),
                k
            )));
        }
        if let Some(&bad) = bits.iter().find(|&&b| b > 1) {
            return Err(Error::InvalidConfig(format!("bit value {bad} is not 0 or 1")));
        }

        Ok(bits
            .chunks(k)
            .map(|chunk| {
                let index = chunk.iter().fold(0usize, |acc, &b| (acc << 1) | b as usize);
                self.points[index]
            })
            .collect())
    }

    /// Minimum-distance hard decision back to bits
    pub fn demap_hard(&self, symbols: &[Complex32]) -> Vec<u8> {
        symbols
            .iter()
            .flat_map(|&y| {
                let mut best_index = 0;
                let mut best_dist = f32::MAX;
                for (index, &point) in self.points.iter().enumerate() {
                    let dist = (y - point).norm_sqr();
                    if dist < best_dist {
                        best_dist = dist;
                        best_index = index;
                    }
                }
                index_bits(best_index, self.bits_per_symbol)
            })
            .collect()
    }
}

/// Mean of |x|^2
pub fn average_energy(symbols: &[Complex32]) -> f32 {
    if symbols.is_empty() {
        return 0.0;
    }
    symbols.iter().map(|s| s.norm_sqr()).sum::<f32>() / symbols.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qpsk_points() {
        let mapper = Mapper::qam(2).unwrap();
        let h = std::f32::consts::FRAC_1_SQRT_2;

        let symbols = mapper.map(&[0, 0, 0, 1, 1, 0, 1, 1]).unwrap();
        let expected = [
            Complex32::new(h, h),
            Complex32::new(h, -h),
            Complex32::new(-h, h),
            Complex32::new(-h, -h),
        ];
        for (got, want) in symbols.iter().zip(expected) {
            assert!((got - want).norm() < 1e-6, "{} vs {}", got, want);
        }
    }

    #[test]
    fn test_unit_energy() {
        for k in [2, 4, 6, 8] {
            let mapper = Mapper::qam(k).unwrap();
            let energy = average_energy(mapper.points());
            assert!((energy - 1.0).abs() < 1e-5, "{}-bit QAM energy {}", k, energy);
        }
    }

    #[test]
    fn test_gray_neighbours_differ_in_one_bit() {
        let mapper = Mapper::qam(4).unwrap();
        let points = mapper.points();
        let min_dist = 2.0 / 10f32.sqrt();

        for (a, &pa) in points.iter().enumerate() {
            for (b, &pb) in points.iter().enumerate() {
                if ((pa - pb).norm() - min_dist).abs() < 1e-4 {
                    assert_eq!((a ^ b).count_ones(), 1, "labels {:04b} and {:04b}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_demap_noiseless() {
        let mapper = Mapper::qam(6).unwrap();
        let bits: Vec<u8> = (0..6 * 64).map(|i| ((i * 7 + i / 5) % 2) as u8).collect();

        let symbols = mapper.map(&bits).unwrap();
        assert_eq!(symbols.len(), 64);
        assert_eq!(mapper.demap_hard(&symbols), bits);
    }

    #[test]
    fn test_invalid_input() {
        assert!(Mapper::qam(3).is_err());
        assert!(Mapper::qam(0).is_err());

        let mapper = Mapper::qam(2).unwrap();
        assert!(mapper.map(&[0, 1, 1]).is_err());
        assert!(mapper.map(&[0, 2]).is_err());
    }
}
