use anyhow::{Context, Result};

use stmtx::config::ALL_FILE_FAMILIES;
use stmtx::settings::{load_settings, resolve_config_dir, save_settings};

pub fn run(config_dir: Option<&str>, force: bool) -> Result<()> {
    let mut settings = load_settings();
    let dir = resolve_config_dir(config_dir, &settings);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Could not create {}", dir.display()))?;
    let dir = std::fs::canonicalize(&dir).unwrap_or(dir);

    for family in ALL_FILE_FAMILIES {
        let path = dir.join(family.config_file_name());
        if path.exists() && !force {
            println!("Kept existing {}", path.display());
            continue;
        }
        std::fs::write(&path, family.bundled_config())
            .with_context(|| format!("Could not write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    settings.config_dir = dir.to_string_lossy().to_string();
    save_settings(&settings)?;
    println!("Configuration directory: {}", dir.display());
    println!("Parse a statement with `stmtx parse <file>`.");
    Ok(())
}
