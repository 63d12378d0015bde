use burn::backend::NdArray;
use phylab::{
    BlerModel, EesmPhyAbstraction, InnerLoopLinkAdaptation, LinkAdaptation, McsCategory, McsTable,
    PhyAbstraction, SinrGrid,
};

type Backend = NdArray;

const NUM_SYM: usize = 14;
const NUM_SC: usize = 48;
const BLER_TARGET: f32 = 0.1;

fn main() -> phylab::Result<()> {
    println!("=== Link Adaptation Sweep (flat SINR, 1 UT) ===\n");

    let device = Default::default();
    let model = BlerModel::default();
    let mut la = InnerLoopLinkAdaptation::new(model.clone(), BLER_TARGET)?;
    let mut phy = EesmPhyAbstraction::new(model, 42);

    for table_index in 1..=3u8 {
        let table = McsTable::new(table_index, McsCategory::Pdsch)?;
        println!("MCS table {}", table_index);
        println!("  SINR (dB) | MCS | Qm | TBS (bits) | TBLER");
        println!("  ----------|-----|----|------------|--------");

        for sinr_db in (-5..=30).step_by(5) {
            let values = vec![sinr_db as f32; NUM_SYM * NUM_SC];
            let sinr = SinrGrid::<Backend>::from_db(&device, values, NUM_SYM, NUM_SC, 1)?;

            let mcs = LinkAdaptation::<Backend>::select_mcs(&mut la, &sinr, &table)?;
            let outcome = PhyAbstraction::<Backend>::evaluate(&mut phy, &mcs, &sinr, &table)?;
            let entry = table.entry(mcs[0])?;

            println!(
                "  {:>9} | {:>3} | {:>2} | {:>10} | {:.4}",
                sinr_db,
                mcs[0],
                entry.modulation_order,
                entry.transport_block_size(NUM_SYM * NUM_SC),
                outcome.tbler[0]
            );
        }
        println!();
    }

    Ok(())
}
