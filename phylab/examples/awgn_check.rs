use phylab::{average_energy, bit_error_rate, ebno_to_no, AwgnChannel, Mapper};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::io::Write;

const BATCH_SIZE: usize = 32;
const BLOCK_LENGTH: usize = 64;
const BITS_PER_SYMBOL: usize = 2;
const EBNO_DB: f32 = 10.0;

fn main() -> phylab::Result<()> {
    println!("=== AWGN Channel Check ===\n");

    let mut rng = StdRng::seed_from_u64(42);
    let mapper = Mapper::qam(BITS_PER_SYMBOL)?;
    let channel = AwgnChannel::new();

    let bits: Vec<u8> = (0..BATCH_SIZE * BLOCK_LENGTH).map(|_| rng.gen_range(0..2)).collect();
    let tx = mapper.map(&bits)?;

    let tx_power = average_energy(&tx);
    let no = ebno_to_no(EBNO_DB, tx_power, BITS_PER_SYMBOL, 1.0);
    let rx = channel.apply(&mut rng, &tx, no)?;

    let noise: Vec<_> = rx.iter().zip(&tx).map(|(r, t)| r - t).collect();
    let noise_power = average_energy(&noise);
    let ber = bit_error_rate(&bits, &mapper.demap_hard(&rx));

    println!("Bits:          {} x {}", BATCH_SIZE, BLOCK_LENGTH);
    println!("Modulation:    {}-QAM", 1 << BITS_PER_SYMBOL);
    println!("Eb/N0:         {:.1} dB", EBNO_DB);
    println!("Tx power:      {:.4}", tx_power);
    println!("Noise power:   {:.4} (expected {:.4})", noise_power, no);
    println!("BER:           {:.2e}", ber);

    fs::create_dir_all("results")?;
    let mut file = fs::File::create("results/awgn_result.txt")?;
    writeln!(file, "ebno_db = {EBNO_DB}")?;
    writeln!(file, "tx_power = {tx_power}")?;
    writeln!(file, "noise_power = {noise_power}")?;
    writeln!(file, "ber = {ber}")?;

    println!("\n✓ Result saved to results/awgn_result.txt");
    Ok(())
}
