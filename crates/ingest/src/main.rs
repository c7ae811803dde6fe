use ingest::runtime::{boot, run};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    boot::init_logging();
    let (ingestor, config) = boot::boot()?;
    run::run(ingestor, &config)?;
    Ok(())
}
