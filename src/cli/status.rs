use crate::catalog::{catalog_path, load_catalog};
use crate::error::Result;
use crate::settings::{load_settings, settings_file_exists};

pub fn run() -> Result<()> {
    let settings = load_settings()?;
    let data_dir = settings.data_dir.clone();
    let catalog_file = catalog_path(&data_dir);

    println!("Operator:   {}", if settings.operator.is_empty() { "(not set)" } else { &settings.operator });
    println!("Data dir:   {}", data_dir.display());
    if !settings_file_exists() {
        println!("Settings not saved yet. Run `regop init` to set up.");
    }

    let catalog = load_catalog(&data_dir)?;
    if catalog_file.exists() {
        println!("Catalog:    {}", catalog_file.display());
    } else {
        println!("Catalog:    built-in defaults");
    }
    println!("Assets:     {}", catalog.asset_dir(&data_dir).display());

    let c = &catalog.columns;
    println!();
    println!("Carriers:      {}", catalog.carriers.len());
    println!("Concepts:      {}", catalog.concepts.len());
    println!("Destinations:  {}", catalog.destinations.len());
    println!("Equivalences:  {}", catalog.company_equivalences.len());
    println!(
        "Columns:       date={} destination={} company={} hour={}",
        c.date, c.destination, c.company, c.hour
    );
    Ok(())
}
