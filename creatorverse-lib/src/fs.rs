use std::{fs::create_dir_all, io, path::PathBuf};

use xdg::BaseDirectories;

/// Returns the path to the Creatorverse configuration directory. If it doesn't exist when this
/// function is called, it will be created.
pub fn config_dir() -> io::Result<PathBuf> {
    let path = xdg_prefix()
        .get_config_home()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "$HOME must exist"))?;

    create_dir_all(&path)?;

    Ok(path)
}

fn xdg_prefix() -> BaseDirectories {
    xdg::BaseDirectories::with_prefix("creatorverse")
}
