use dialoguer::Input;

use crate::catalog::{catalog_path, save_catalog, Catalog};
use crate::error::Result;
use crate::settings::{expand_user_path, load_settings, save_settings, settings_file_exists};

pub fn run(data_dir: Option<String>, operator: Option<String>) -> Result<()> {
    let mut settings = load_settings()?;

    if let Some(dir) = data_dir {
        settings.data_dir = expand_user_path(&dir);
    } else if !settings_file_exists() {
        // First run: prompt for data dir
        let chosen: String = Input::new()
            .with_prompt("Data directory")
            .default(settings.data_dir.display().to_string())
            .interact_text()?;
        settings.data_dir = expand_user_path(chosen.trim());
    }
    if let Some(name) = operator {
        settings.operator = name;
    }

    save_settings(&settings)?;

    let resolved = settings.data_dir.clone();
    std::fs::create_dir_all(resolved.join("exports"))?;
    std::fs::create_dir_all(resolved.join("registros"))?;

    let catalog = if catalog_path(&resolved).exists() {
        crate::catalog::load_catalog(&resolved)?
    } else {
        let catalog = Catalog::default();
        save_catalog(&resolved, &catalog)?;
        println!("Wrote default catalog to {}", catalog_path(&resolved).display());
        catalog
    };
    std::fs::create_dir_all(catalog.asset_dir(&resolved).join("logos"))?;

    println!("Initialized regop at {}", resolved.display());
    Ok(())
}
