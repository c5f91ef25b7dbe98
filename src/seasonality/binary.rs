//! Locating (and if needed installing) the X13 executable.
//!
//! Lookup order: explicit path, environment variable, a recursive search
//! below the configured root, then a download into the application data
//! directory. A located binary is cached in the environment variable for the
//! rest of the process.

use crate::config::X13Config;
use crate::error::{Result, TransformError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const DOWNLOAD_BASE: &str =
    "https://raw.githubusercontent.com/rxavier/econuy-extras/main/econuy_extras/x13";

/// Serializes lookups so two threads never download at the same time.
static LOCATE_LOCK: Mutex<()> = Mutex::new(());

/// File name of the binary for this platform.
pub fn binary_name(prefer_x13: bool) -> String {
    let stem = if prefer_x13 { "x13as" } else { "x12a" };
    if cfg!(windows) {
        format!("{stem}.exe")
    } else {
        stem.to_string()
    }
}

/// Find the X13 binary described by `config`.
pub fn locate(config: &X13Config) -> Result<PathBuf> {
    if let Some(path) = &config.binary_path {
        return if path.is_file() {
            Ok(path.clone())
        } else {
            Err(TransformError::BinaryNotFound(format!(
                "{} does not exist",
                path.display()
            )))
        };
    }

    let _guard = LOCATE_LOCK
        .lock()
        .map_err(|_| TransformError::Io("binary lookup lock poisoned".to_string()))?;

    if let Some(path) = std::env::var_os(&config.env_var).map(PathBuf::from) {
        if path.is_file() {
            tracing::debug!(path = %path.display(), "using X13 binary from environment");
            return Ok(path);
        }
        tracing::warn!(
            env_var = %config.env_var,
            path = %path.display(),
            "environment variable points to a missing file, searching instead"
        );
    }

    let name = binary_name(config.prefer_x13);
    let root = match &config.search_root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };
    let start = ancestor(&root, config.search_parents);
    if let Some(found) = search(start, &name) {
        tracing::info!(path = %found.display(), "found X13 binary");
        cache_location(&config.env_var, &found);
        return Ok(found);
    }

    if !config.allow_download {
        return Err(TransformError::BinaryNotFound(format!(
            "no {name} below {} and downloads are disabled",
            start.display()
        )));
    }
    if !config.prefer_x13 {
        return Err(TransformError::BinaryNotFound(
            "only x13as can be downloaded".to_string(),
        ));
    }

    let dir = match &config.download_dir {
        Some(dir) => dir.clone(),
        None => default_download_dir()?,
    };
    let installed = download(&dir, &name)?;
    cache_location(&config.env_var, &installed);
    Ok(installed)
}

fn ancestor(root: &Path, levels: usize) -> &Path {
    let mut current = root;
    for _ in 0..levels {
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }
    current
}

/// Depth-first search for a file called `name`.
fn search(dir: &Path, name: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_file() && entry.file_name() == name {
            return Some(path);
        }
        if file_type.is_dir() {
            subdirs.push(path);
        }
    }
    subdirs.sort();
    subdirs.iter().find_map(|sub| search(sub, name))
}

fn default_download_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", "econuy")
        .map(|dirs| dirs.data_dir().join("x13"))
        .ok_or_else(|| {
            TransformError::BinaryNotFound("no home directory to install into".to_string())
        })
}

/// Platform-specific path of the prebuilt binary, relative to the download
/// base.
pub fn download_path(os: &str, arch: &str) -> Result<String> {
    let arch_dir = match arch {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        other => {
            return Err(TransformError::BinaryNotFound(format!(
                "no prebuilt binary for architecture '{other}'"
            )))
        }
    };
    match os {
        "windows" => Ok("windows/x13as.exe".to_string()),
        "macos" => Ok(format!("darwin/{arch_dir}/x13as")),
        "linux" => Ok(format!("linux/{arch_dir}/x13as")),
        other => Err(TransformError::BinaryNotFound(format!(
            "no prebuilt binary for '{other}'"
        ))),
    }
}

fn download(dir: &Path, name: &str) -> Result<PathBuf> {
    let target = dir.join(name);
    if target.is_file() {
        tracing::debug!(path = %target.display(), "X13 binary already installed");
        return Ok(target);
    }

    let url = format!(
        "{DOWNLOAD_BASE}/{}",
        download_path(std::env::consts::OS, std::env::consts::ARCH)?
    );
    tracing::info!(%url, "downloading X13 binary");

    let response = reqwest::blocking::get(&url)
        .map_err(|e| TransformError::Download(format!("request to {url} failed: {e}")))?;
    if !response.status().is_success() {
        return Err(TransformError::Download(format!(
            "{url} returned status {}",
            response.status()
        )));
    }
    let bytes = response
        .bytes()
        .map_err(|e| TransformError::Download(format!("reading {url} failed: {e}")))?;

    fs::create_dir_all(dir)?;
    fs::write(&target, &bytes)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&target, fs::Permissions::from_mode(0o755))?;
    }
    tracing::info!(path = %target.display(), bytes = bytes.len(), "installed X13 binary");
    Ok(target)
}

fn cache_location(env_var: &str, path: &Path) {
    std::env::set_var(env_var, path);
}
