//! Formats command implementation

use anyhow::Result;

use crate::transcript::FormatRegistry;

pub fn run(registry: &FormatRegistry) -> Result<()> {
    println!("{:<14} {}", "Format", "Description");
    println!("{}", "-".repeat(60));

    for format in registry.all_formats() {
        println!("{:<14} {}", format.id(), format.description());
    }
    Ok(())
}
