/// Random SINR grids
///
/// One grid per trial, shaped `[num_sym, num_sc, num_ut, 1]`:
/// - a base SINR (dB) per UT, uniform over the configured range
/// - i.i.d. Gaussian perturbation (dB) per resource element
/// - conversion to linear units on the backend
///
/// The draws come from a caller-owned generator so that a seeded run is
/// reproducible.

use burn::tensor::{backend::Backend, Tensor, TensorData};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::config::ExperimentConfig;
use crate::error::{Error, Result};
use crate::units::{db_to_lin_tensor, lin_to_db_tensor};

/// Per-resource-element SINR in linear units
#[derive(Clone, Debug)]
pub struct SinrGrid<B: Backend> {
    linear: Tensor<B, 4>,
}

impl<B: Backend> SinrGrid<B> {
    /// Wrap a linear SINR tensor shaped `[num_sym, num_sc, num_ut, 1]`
    pub fn from_linear(linear: Tensor<B, 4>) -> Result<Self> {
        let dims = linear.dims();
        if dims[3] != 1 || dims.iter().any(|&d| d == 0) {
            return Err(Error::InvalidConfig(format!(
                "SINR grid must be [num_sym, num_sc, num_ut, 1] with non-zero sizes, got {:?}",
                dims
            )));
        }
        Ok(Self { linear })
    }

    /// Build a grid from dB values laid out row-major as `[sym][sc][ut]`
    pub fn from_db(
        device: &B::Device,
        values_db: Vec<f32>,
        num_sym: usize,
        num_sc: usize,
        num_ut: usize,
    ) -> Result<Self> {
        let expected = num_sym * num_sc * num_ut;
        if values_db.len() != expected {
            return Err(Error::InvalidConfig(format!(
                "expected {} SINR values, got {}",
                expected,
                values_db.len()
            )));
        }
        let data = TensorData::new(values_db, [num_sym, num_sc, num_ut, 1]);
        let db = Tensor::<B, 4>::from_data(data, device);
        Self::from_linear(db_to_lin_tensor(db))
    }

    pub fn linear(&self) -> &Tensor<B, 4> {
        &self.linear
    }

    pub fn to_db(&self) -> Tensor<B, 4> {
        lin_to_db_tensor(self.linear.clone())
    }

    pub fn dims(&self) -> [usize; 4] {
        self.linear.dims()
    }

    pub fn num_ut(&self) -> usize {
        self.linear.dims()[2]
    }

    /// Resource elements per UT
    pub fn num_re(&self) -> usize {
        let [num_sym, num_sc, _, _] = self.linear.dims();
        num_sym * num_sc
    }

    /// Same grid with every element of UT `u` scaled by `offsets_db[u]`
    pub fn with_offsets_db(&self, offsets_db: &[f32]) -> Result<Self> {
        let num_ut = self.num_ut();
        if offsets_db.len() != num_ut {
            return Err(Error::ShapeMismatch {
                expected: num_ut,
                actual: offsets_db.len(),
            });
        }
        let device = self.linear.device();
        let offsets = Tensor::<B, 4>::from_data(TensorData::new(offsets_db.to_vec(), [1, 1, num_ut, 1]), &device);
        let scale = db_to_lin_tensor(offsets);
        Ok(Self {
            linear: self.linear.clone() * scale,
        })
    }
}

/// Draws SINR grids for one experiment configuration
#[derive(Clone, Debug)]
pub struct SinrGenerator {
    low_db: f32,
    high_db: f32,
    perturbation: Normal<f32>,
    num_sym: usize,
    num_sc: usize,
    num_ut: usize,
}

impl SinrGenerator {
    pub fn new(config: &ExperimentConfig) -> Result<Self> {
        let [low_db, high_db] = config.sinr_range;
        if low_db > high_db {
            return Err(Error::InvalidConfig(format!(
                "sinr_range must be ordered, got [{low_db}, {high_db}]"
            )));
        }
        let perturbation = Normal::new(0.0, config.sinr_spread_db)
            .map_err(|e| Error::InvalidConfig(format!("sinr_spread_db: {e}")))?;

        Ok(Self {
            low_db,
            high_db,
            perturbation,
            num_sym: config.num_sym,
            num_sc: config.num_sc,
            num_ut: config.num_ut,
        })
    }

    /// Grid shape `[num_sym, num_sc, num_ut, 1]`
    pub fn shape(&self) -> [usize; 4] {
        [self.num_sym, self.num_sc, self.num_ut, 1]
    }

    /// One grid in dB, row-major `[sym][sc][ut]`
    pub fn sample_db<R: Rng>(&self, rng: &mut R) -> Vec<f32> {
        let base_db: Vec<f32> = (0..self.num_ut)
            .map(|_| {
                if self.low_db == self.high_db {
                    self.low_db
                } else {
                    rng.gen_range(self.low_db..=self.high_db)
                }
            })
            .collect();

        let mut values = Vec::with_capacity(self.num_sym * self.num_sc * self.num_ut);
        for _ in 0..self.num_sym * self.num_sc {
            for &base in &base_db {
                values.push(base + self.perturbation.sample(rng));
            }
        }
        values
    }

    /// One grid in linear units on `device`
    pub fn sample<B: Backend, R: Rng>(&self, rng: &mut R, device: &B::Device) -> Result<SinrGrid<B>> {
        let values_db = self.sample_db(rng);
        SinrGrid::from_db(device, values_db, self.num_sym, self.num_sc, self.num_ut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_all_close_to, TestBackend};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config(range: [f32; 2], spread: f32) -> ExperimentConfig {
        let yaml = format!(
            "experiment_id: t\nnum_experiments: 1\nnum_ut: 3\nnum_sym: 2\nnum_sc: 5\n\
             sinr_range: [{}, {}]\nbler_target: 0.1\nmcs_table_index: 1\nmcs_category: 0\n\
             sinr_spread_db: {}\n",
            range[0], range[1], spread
        );
        ExperimentConfig::from_yaml_str(&yaml).unwrap()
    }

    #[test]
    fn test_zero_db_is_unit_linear() {
        let device = Default::default();
        let generator = SinrGenerator::new(&config([0.0, 0.0], 0.0)).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let grid = generator.sample::<TestBackend, _>(&mut rng, &device).unwrap();

        assert_eq!(grid.dims(), [2, 5, 3, 1]);
        let values = grid.linear().clone().into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|&v| v == 1.0), "values: {:?}", values);
    }

    #[test]
    fn test_base_broadcast_per_ut() {
        let generator = SinrGenerator::new(&config([0.0, 30.0], 0.0)).unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        let values = generator.sample_db(&mut rng);
        assert_eq!(values.len(), 2 * 5 * 3);

        // Without perturbation every resource element repeats the UT base value
        let first: Vec<f32> = values[..3].to_vec();
        for chunk in values.chunks(3) {
            assert_eq!(chunk, first.as_slice());
        }
        assert!(first.iter().all(|&v| (0.0..=30.0).contains(&v)));
    }

    #[test]
    fn test_seeded_draws_repeat() {
        let generator = SinrGenerator::new(&config([-5.0, 15.0], 2.0)).unwrap();

        let a = generator.sample_db(&mut StdRng::seed_from_u64(42));
        let b = generator.sample_db(&mut StdRng::seed_from_u64(42));
        let c = generator.sample_db(&mut StdRng::seed_from_u64(43));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_offsets_scale_each_ut() {
        let device = Default::default();
        let grid = SinrGrid::<TestBackend>::from_db(&device, vec![0.0; 2 * 2 * 2], 2, 2, 2).unwrap();

        let shifted = grid.with_offsets_db(&[10.0, -10.0]).unwrap();
        let ut0 = shifted.linear().clone().slice([0..2, 0..2, 0..1, 0..1]);
        let ut1 = shifted.linear().clone().slice([0..2, 0..2, 1..2, 0..1]);

        assert_all_close_to(&ut0, 10.0, 1e-4, "ut0");
        assert_all_close_to(&ut1, 0.1, 1e-6, "ut1");
        assert!(grid.with_offsets_db(&[1.0]).is_err());
    }

    #[test]
    fn test_bad_shape_rejected() {
        let device = Default::default();
        assert!(SinrGrid::<TestBackend>::from_db(&device, vec![0.0; 5], 2, 2, 2).is_err());

        let wide = Tensor::<TestBackend, 4>::ones([2, 2, 2, 2], &device);
        assert!(SinrGrid::from_linear(wide).is_err());
    }
}
