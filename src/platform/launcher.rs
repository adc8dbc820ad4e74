//! Platform launchers

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use thiserror::Error;

/// Errors raised when the OS rejects a handoff
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Package not found: {}", .0.display())]
    MissingPackage(PathBuf),

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Handoff rejected: {0}")]
    Rejected(String),
}

/// Hands URLs and package files over to the operating system
pub trait PlatformLauncher: Send + Sync {
    /// Open a URL with the default handler (browser, store app)
    fn open_url(&self, url: &str) -> Result<(), LaunchError>;

    /// Launch the package installer for a downloaded file
    fn install_package(&self, path: &Path) -> Result<(), LaunchError>;
}

/// Launcher backed by the desktop opener of the current OS
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl SystemLauncher {
    fn opener_command(target: &str) -> Command {
        #[cfg(target_os = "windows")]
        {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", "", target]);
            cmd
        }
        #[cfg(target_os = "macos")]
        {
            let mut cmd = Command::new("open");
            cmd.arg(target);
            cmd
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(target);
            cmd
        }
    }

    fn spawn_opener(target: &str) -> Result<(), LaunchError> {
        let mut cmd = Self::opener_command(target);
        let program = cmd.get_program().to_string_lossy().into_owned();
        let child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            program: program.clone(),
            source,
        })?;
        reap_in_background(program, child);
        Ok(())
    }
}

/// Wait for an opener to exit; a non-zero status means the OS refused the target
fn wait_for_opener(program: &str, mut child: Child) -> Result<(), LaunchError> {
    let status = child.wait().map_err(|source| LaunchError::Spawn {
        program: program.to_string(),
        source,
    })?;
    if status.success() {
        Ok(())
    } else {
        Err(LaunchError::Rejected(format!("{} exited with {}", program, status)))
    }
}

fn reap_in_background(program: String, child: Child) {
    let spawned = std::thread::Builder::new()
        .name("opener-reaper".to_string())
        .spawn(move || {
            if let Err(e) = wait_for_opener(&program, child) {
                tracing::warn!("{}", e);
            }
        });
    if let Err(e) = spawned {
        tracing::warn!("Failed to start opener reaper: {}", e);
    }
}

impl PlatformLauncher for SystemLauncher {
    fn open_url(&self, url: &str) -> Result<(), LaunchError> {
        tracing::info!("Opening URL: {}", url);
        Self::spawn_opener(url)
    }

    fn install_package(&self, path: &Path) -> Result<(), LaunchError> {
        if !path.is_file() {
            return Err(LaunchError::MissingPackage(path.to_path_buf()));
        }
        tracing::info!("Launching installer for {}", path.display());
        Self::spawn_opener(&path.to_string_lossy())
    }
}

/// Launcher that records handoffs without launching anything
///
/// Used for dry runs and for inspecting what the bridge would have launched.
#[derive(Debug, Default)]
pub struct LogOnlyLauncher {
    opened_urls: Mutex<Vec<String>>,
    installed: Mutex<Vec<PathBuf>>,
}

impl LogOnlyLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs passed to `open_url` so far
    pub fn opened_urls(&self) -> Vec<String> {
        self.opened_urls.lock().clone()
    }

    /// Packages passed to `install_package` so far
    pub fn installed_packages(&self) -> Vec<PathBuf> {
        self.installed.lock().clone()
    }
}

impl PlatformLauncher for LogOnlyLauncher {
    fn open_url(&self, url: &str) -> Result<(), LaunchError> {
        tracing::info!("Dry run: would open {}", url);
        self.opened_urls.lock().push(url.to_string());
        Ok(())
    }

    fn install_package(&self, path: &Path) -> Result<(), LaunchError> {
        if !path.is_file() {
            return Err(LaunchError::MissingPackage(path.to_path_buf()));
        }
        tracing::info!("Dry run: would install {}", path.display());
        self.installed.lock().push(path.to_path_buf());
        Ok(())
    }
}

/// Human-readable platform description, e.g. `linux (x86_64)`
pub fn platform_version(label: Option<&str>) -> String {
    match label {
        Some(label) if !label.trim().is_empty() => label.to_string(),
        _ => format!("{} ({})", std::env::consts::OS, std::env::consts::ARCH),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_only_launcher_records_urls() {
        let launcher = LogOnlyLauncher::new();
        launcher.open_url("https://apps.apple.com/app/id42").unwrap();
        assert_eq!(launcher.opened_urls(), vec!["https://apps.apple.com/app/id42"]);
    }

    #[test]
    fn test_log_only_launcher_requires_existing_package() {
        let launcher = LogOnlyLauncher::new();
        let err = launcher
            .install_package(Path::new("/definitely/not/here.apk"))
            .unwrap_err();
        assert!(matches!(err, LaunchError::MissingPackage(_)));
        assert!(launcher.installed_packages().is_empty());
    }

    #[test]
    fn test_log_only_launcher_records_packages() {
        let temp_dir = TempDir::new().unwrap();
        let package = temp_dir.path().join("update.apk");
        std::fs::write(&package, b"pkg").unwrap();

        let launcher = LogOnlyLauncher::new();
        launcher.install_package(&package).unwrap();
        assert_eq!(launcher.installed_packages(), vec![package]);
    }

    #[test]
    fn test_system_launcher_rejects_missing_package() {
        let err = SystemLauncher
            .install_package(Path::new("/definitely/not/here.apk"))
            .unwrap_err();
        assert!(err.to_string().contains("Package not found"));
    }

    #[cfg(unix)]
    #[test]
    fn test_opener_exit_status() {
        let ok = Command::new("sh").args(["-c", "exit 0"]).spawn().unwrap();
        assert!(wait_for_opener("sh", ok).is_ok());

        let refused = Command::new("sh").args(["-c", "exit 3"]).spawn().unwrap();
        let err = wait_for_opener("sh", refused).unwrap_err();
        assert!(matches!(err, LaunchError::Rejected(_)));
        assert!(err.to_string().contains("sh exited with"));
    }

    #[test]
    fn test_platform_version() {
        assert_eq!(platform_version(Some("Android 14")), "Android 14");
        let default = platform_version(None);
        assert!(default.starts_with(std::env::consts::OS));
        assert_eq!(platform_version(Some("  ")), default);
    }
}
