use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::config::Settings;
use crate::convert::MappingError;

/// Initializes the files the binary needs: the config file and the data directory.
pub fn init(config_path: &Path) -> io::Result<()> {
    create_config(config_path)
}

/// Creates the config file with default settings if it does not already exist.
fn create_config(path: &Path) -> io::Result<()> {
    let content = Settings::default()
        .to_json_pretty()
        .map_err(io::Error::other)?;

    if create_file(path, &content)? {
        info!("Created default config file {}", path.display());
    }
    Ok(())
}

/// Creates `path` with `content`. Returns `false` if the file was already there.
fn create_file(path: &Path, content: &str) -> io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(true)
}

/// Makes sure the data directory exists, warning when it has to be created since it will not
/// hold any of the tables yet.
pub fn create_dirs(data_path: &Path) {
    if data_path.is_dir() {
        return;
    }
    match fs::create_dir_all(data_path) {
        Ok(_) => warn!(
            "Created empty data directory {}, the block and item tables must be copied there",
            data_path.display()
        ),
        Err(e) => warn!(
            "Failed to create data directory {} as error: {}",
            data_path.display(),
            e
        ),
    }
}

/// Reads a resource file from the data directory, returning its full path along with the bytes.
pub fn read_resource(data_path: &Path, file_name: &str) -> Result<(PathBuf, Vec<u8>), MappingError> {
    let path = data_path.join(file_name);
    match fs::read(&path) {
        Ok(contents) => Ok((path, contents)),
        Err(source) => Err(MappingError::MissingResource { path, source }),
    }
}

/// Writes an encoded output file, creating the directory if needed.
pub fn write_output(dir: &Path, file_name: &str, contents: &[u8]) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    fs::write(&path, contents)?;
    Ok(path)
}
