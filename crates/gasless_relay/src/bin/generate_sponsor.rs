use env_logger::Env;
use gasless_relay::SponsorAccountManager;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let (_, generated) = SponsorAccountManager::generate();

    println!("Sponsor address: {}", generated.address);
    println!();
    println!("Add this line to your .env file and keep it secret:");
    println!("SPONSOR_MNEMONIC=\"{}\"", generated.mnemonic);
    println!();
    println!("Fund the address before enabling gasless transactions.");
}
