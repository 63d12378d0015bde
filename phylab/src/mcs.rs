/// Modulation and coding scheme tables
///
/// NR MCS index tables from 3GPP TS 38.214 (section 5.1.3.1) with transform
/// precoding disabled, which PUSCH and PDSCH share:
/// - Table 1: 5.1.3.1-1, up to 64QAM
/// - Table 2: 5.1.3.1-2, up to 256QAM
/// - Table 3: 5.1.3.1-3, low spectral efficiency 64QAM
///
/// Transport block sizing follows the simplified rule
/// `max(24, floor(N_re * Qm * R / 8) * 8)` and LDPC base graph 1 code block
/// segmentation (TS 38.212 section 5.2.2).

use serde::Deserialize;
use std::fmt;

use crate::error::{Error, Result};

/// Maximum LDPC code block size (base graph 1)
pub const MAX_CODE_BLOCK_SIZE: u64 = 8448;

/// CRC length attached to transport blocks and to each segmented code block
pub const CRC_LENGTH: u64 = 24;

/// Smallest transport block the abstraction will schedule
pub const MIN_TBS: u64 = 24;

/// Which physical channel the MCS table is interpreted for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "CategoryRepr")]
pub enum McsCategory {
    /// Uplink shared channel (category 0)
    Pusch,
    /// Downlink shared channel (category 1)
    Pdsch,
}

/// YAML accepts either the numeric category or its name
#[derive(Deserialize)]
#[serde(untagged)]
enum CategoryRepr {
    Index(u8),
    Name(String),
}

impl TryFrom<CategoryRepr> for McsCategory {
    type Error = String;

    fn try_from(repr: CategoryRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            CategoryRepr::Index(0) => Ok(McsCategory::Pusch),
            CategoryRepr::Index(1) => Ok(McsCategory::Pdsch),
            CategoryRepr::Index(other) => Err(format!("unknown MCS category {other} (expected 0 or 1)")),
            CategoryRepr::Name(name) => match name.to_ascii_lowercase().as_str() {
                "pusch" => Ok(McsCategory::Pusch),
                "pdsch" => Ok(McsCategory::Pdsch),
                _ => Err(format!("unknown MCS category '{name}' (expected pusch or pdsch)")),
            },
        }
    }
}

impl fmt::Display for McsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            McsCategory::Pusch => write!(f, "PUSCH"),
            McsCategory::Pdsch => write!(f, "PDSCH"),
        }
    }
}

/// One row of an MCS table
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct McsEntry {
    /// Bits per modulation symbol (Qm)
    pub modulation_order: u32,

    /// Target code rate scaled by 1024, as printed in the standard
    pub code_rate_x1024: f32,
}

impl McsEntry {
    const fn new(modulation_order: u32, code_rate_x1024: f32) -> Self {
        Self { modulation_order, code_rate_x1024 }
    }

    /// Code rate R in (0, 1)
    pub fn code_rate(&self) -> f32 {
        self.code_rate_x1024 / 1024.0
    }

    /// Information bits per resource element (Qm * R)
    pub fn spectral_efficiency(&self) -> f32 {
        self.modulation_order as f32 * self.code_rate()
    }

    /// Transport block size in bits for `num_re` resource elements
    pub fn transport_block_size(&self, num_re: usize) -> u64 {
        let n_info = num_re as f64 * self.spectral_efficiency() as f64;
        let tbs = (n_info / 8.0).floor() as u64 * 8;
        tbs.max(MIN_TBS)
    }
}

/// Number of LDPC code blocks a transport block is segmented into
pub fn num_code_blocks(tbs: u64) -> u32 {
    let b = tbs + CRC_LENGTH;
    if b <= MAX_CODE_BLOCK_SIZE {
        1
    } else {
        b.div_ceil(MAX_CODE_BLOCK_SIZE - CRC_LENGTH) as u32
    }
}

static TABLE_1: [McsEntry; 29] = [
    McsEntry::new(2, 120.0),
    McsEntry::new(2, 157.0),
    McsEntry::new(2, 193.0),
    McsEntry::new(2, 251.0),
    McsEntry::new(2, 308.0),
    McsEntry::new(2, 379.0),
    McsEntry::new(2, 449.0),
    McsEntry::new(2, 526.0),
    McsEntry::new(2, 602.0),
    McsEntry::new(2, 679.0),
    McsEntry::new(4, 340.0),
    McsEntry::new(4, 378.0),
    McsEntry::new(4, 434.0),
    McsEntry::new(4, 490.0),
    McsEntry::new(4, 553.0),
    McsEntry::new(4, 616.0),
    McsEntry::new(4, 658.0),
    McsEntry::new(6, 438.0),
    McsEntry::new(6, 466.0),
    McsEntry::new(6, 517.0),
    McsEntry::new(6, 567.0),
    McsEntry::new(6, 616.0),
    McsEntry::new(6, 666.0),
    McsEntry::new(6, 719.0),
    McsEntry::new(6, 772.0),
    McsEntry::new(6, 822.0),
    McsEntry::new(6, 873.0),
    McsEntry::new(6, 910.0),
    McsEntry::new(6, 948.0),
];

static TABLE_2: [McsEntry; 28] = [
    McsEntry::new(2, 120.0),
    McsEntry::new(2, 193.0),
    McsEntry::new(2, 308.0),
    McsEntry::new(2, 449.0),
    McsEntry::new(2, 602.0),
    McsEntry::new(4, 378.0),
    McsEntry::new(4, 434.0),
    McsEntry::new(4, 490.0),
    McsEntry::new(4, 553.0),
    McsEntry::new(4, 616.0),
    McsEntry::new(4, 658.0),
    McsEntry::new(6, 466.0),
    McsEntry::new(6, 517.0),
    McsEntry::new(6, 567.0),
    McsEntry::new(6, 616.0),
    McsEntry::new(6, 666.0),
    McsEntry::new(6, 719.0),
    McsEntry::new(6, 772.0),
    McsEntry::new(6, 822.0),
    McsEntry::new(6, 873.0),
    McsEntry::new(8, 682.5),
    McsEntry::new(8, 711.0),
    McsEntry::new(8, 754.0),
    McsEntry::new(8, 797.0),
    McsEntry::new(8, 841.0),
    McsEntry::new(8, 885.0),
    McsEntry::new(8, 916.5),
    McsEntry::new(8, 948.0),
];

static TABLE_3: [McsEntry; 29] = [
    McsEntry::new(2, 30.0),
    McsEntry::new(2, 40.0),
    McsEntry::new(2, 50.0),
    McsEntry::new(2, 64.0),
    McsEntry::new(2, 78.0),
    McsEntry::new(2, 99.0),
    McsEntry::new(2, 120.0),
    McsEntry::new(2, 157.0),
    McsEntry::new(2, 193.0),
    McsEntry::new(2, 251.0),
    McsEntry::new(2, 308.0),
    McsEntry::new(2, 379.0),
    McsEntry::new(2, 449.0),
    McsEntry::new(2, 526.0),
    McsEntry::new(2, 602.0),
    McsEntry::new(4, 340.0),
    McsEntry::new(4, 378.0),
    McsEntry::new(4, 434.0),
    McsEntry::new(4, 490.0),
    McsEntry::new(4, 553.0),
    McsEntry::new(4, 616.0),
    McsEntry::new(6, 438.0),
    McsEntry::new(6, 466.0),
    McsEntry::new(6, 517.0),
    McsEntry::new(6, 567.0),
    McsEntry::new(6, 616.0),
    McsEntry::new(6, 666.0),
    McsEntry::new(6, 719.0),
    McsEntry::new(6, 772.0),
];

/// A selected MCS table together with the channel category it serves
#[derive(Clone, Copy, Debug)]
pub struct McsTable {
    index: u8,
    category: McsCategory,
    entries: &'static [McsEntry],
}

impl McsTable {
    /// Look up table `index` (1-based, as in the standard)
    pub fn new(index: u8, category: McsCategory) -> Result<Self> {
        let entries: &'static [McsEntry] = match index {
            1 => &TABLE_1,
            2 => &TABLE_2,
            3 => &TABLE_3,
            _ => {
                return Err(Error::InvalidConfig(format!(
                    "mcs_table_index must be 1, 2 or 3, got {index}"
                )))
            }
        };
        Ok(Self { index, category, entries })
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn category(&self) -> McsCategory {
        self.category
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Row `mcs` of the table
    pub fn entry(&self, mcs: usize) -> Result<McsEntry> {
        self.entries.get(mcs).copied().ok_or(Error::InvalidMcs {
            index: mcs,
            table: self.index,
            len: self.entries.len(),
        })
    }

    pub fn entries(&self) -> &'static [McsEntry] {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_monotonic() {
        for index in 1..=3 {
            let table = McsTable::new(index, McsCategory::Pdsch).unwrap();
            for pair in table.entries().windows(2) {
                assert!(pair[1].modulation_order >= pair[0].modulation_order);
                // Table 1 switches 16QAM -> 64QAM with a marginally lower efficiency
                assert!(
                    pair[1].spectral_efficiency() > 0.99 * pair[0].spectral_efficiency(),
                    "table {} not increasing: {:?}",
                    index,
                    pair
                );
            }
        }
    }

    #[test]
    fn test_unknown_table_rejected() {
        assert!(McsTable::new(0, McsCategory::Pusch).is_err());
        assert!(McsTable::new(4, McsCategory::Pusch).is_err());
    }

    #[test]
    fn test_entry_out_of_range() {
        let table = McsTable::new(2, McsCategory::Pdsch).unwrap();
        assert_eq!(table.len(), 28);
        match table.entry(28) {
            Err(Error::InvalidMcs { index, table, len }) => {
                assert_eq!((index, table, len), (28, 2, 28));
            }
            other => panic!("expected InvalidMcs, got {:?}", other),
        }
    }

    #[test]
    fn test_transport_block_size() {
        // 14 symbols x 12 subcarriers, QPSK R=120/1024
        let entry = TABLE_1[0];
        let tbs = entry.transport_block_size(168);
        assert_eq!(tbs, 32);
        assert_eq!(tbs % 8, 0);

        // Tiny allocations still carry a minimum TB
        assert_eq!(entry.transport_block_size(1), MIN_TBS);
    }

    #[test]
    fn test_code_block_segmentation() {
        assert_eq!(num_code_blocks(100), 1);
        assert_eq!(num_code_blocks(MAX_CODE_BLOCK_SIZE - CRC_LENGTH), 1);
        assert_eq!(num_code_blocks(20_000), 3);
    }

    #[test]
    fn test_category_from_yaml() {
        let by_name: McsCategory = serde_yaml::from_str("PDSCH").unwrap();
        let by_index: McsCategory = serde_yaml::from_str("0").unwrap();
        assert_eq!(by_name, McsCategory::Pdsch);
        assert_eq!(by_index, McsCategory::Pusch);
        assert!(serde_yaml::from_str::<McsCategory>("2").is_err());
    }
}
