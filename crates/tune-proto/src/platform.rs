use std::path::PathBuf;

const APP_DIR: &str = "tunetracker";

#[cfg(unix)]
pub fn mpv_socket_name() -> String {
    format!(
        "{}/tunetracker-mpv-{}.sock",
        std::env::temp_dir().display(),
        std::process::id()
    )
}

#[cfg(windows)]
pub fn mpv_socket_name() -> String {
    format!("tunetracker-mpv-{}", std::process::id())
}

#[cfg(unix)]
pub fn mpv_socket_arg(socket_name: &str) -> String {
    format!("--input-ipc-server={}", socket_name)
}

#[cfg(windows)]
pub fn mpv_socket_arg(socket_name: &str) -> String {
    format!("--input-ipc-server=\\\\.\\pipe\\{}", socket_name)
}

pub fn data_dir() -> PathBuf {
    // ~/.local/share/tunetracker on macOS too, for consistency with Linux
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join(APP_DIR)
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join(APP_DIR)
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

#[cfg(unix)]
pub fn mpv_binary_name() -> &'static str {
    "mpv"
}

#[cfg(windows)]
pub fn mpv_binary_name() -> &'static str {
    "mpv.exe"
}

/// Find the mpv binary: `MPV_PATH` override, beside the current exe, then PATH.
pub fn find_mpv_binary() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("MPV_PATH") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }

    let exe_name = mpv_binary_name();

    if let Ok(current_exe) = std::env::current_exe() {
        if let Some(dir) = current_exe.parent() {
            let local_mpv = dir.join(exe_name);
            if local_mpv.exists() {
                return Some(local_mpv);
            }
        }
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(exe_name))
        .find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_are_namespaced() {
        assert!(data_dir().ends_with(APP_DIR));
        assert!(config_dir().ends_with(APP_DIR));
    }

    #[test]
    fn test_socket_arg_mentions_socket() {
        let name = mpv_socket_name();
        assert!(mpv_socket_arg(&name).contains(&name));
    }
}
