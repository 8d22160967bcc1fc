//! Exemplars command implementation

use anyhow::Result;

use crate::config::Config;

use super::load_exemplars;

pub fn run(config: &Config) -> Result<()> {
    let set = load_exemplars(config)?;

    println!("Version:     {}", set.version());
    println!("Fingerprint: {}", set.fingerprint());
    println!("Phrases:     {}", set.len());
    println!("{}", "-".repeat(40));

    for (index, phrase) in set.phrases().iter().enumerate() {
        println!("{:>3}  {}", index, phrase);
    }
    Ok(())
}
