use dirs::data_dir;
use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
};

static DATA_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    let base = data_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    base.join("movie-scrape")
});

pub fn data_root() -> PathBuf {
    DATA_ROOT.clone()
}

pub fn config_path() -> PathBuf {
    data_root().join("config.json")
}

pub fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    if let Err(err) = fs::create_dir_all(dir) {
        tracing::error!(dir = %dir.display(), error = %err, "failed to create directory");
        return Err(err);
    }
    Ok(())
}
