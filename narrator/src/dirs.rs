use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::NarratorError;

pub fn get_config_path() -> Result<PathBuf, NarratorError> {
    let home_dir = env::var("HOME").map_err(NarratorError::Home)?;
    let config_dir = PathBuf::from(home_dir).join(".config/narrator");
    fs::create_dir_all(&config_dir)?;
    Ok(config_dir)
}

pub fn get_config_file<P: AsRef<Path>>(config: &Path, file: P) -> PathBuf {
    config.join(file)
}
