//! Test fixture utilities.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// An INI file written to a private temporary directory.
///
/// The directory and file are removed when the fixture is dropped.
pub struct TempIniFile {
    dir: TempDir,
    path: PathBuf,
}

impl TempIniFile {
    /// Write `contents` to `file_name` inside a fresh temporary directory.
    pub fn new(file_name: &str, contents: &str) -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(file_name);
        std::fs::write(&path, contents)?;
        Ok(Self { dir, path })
    }

    /// A credentials file with the given contents.
    pub fn credentials(contents: &str) -> std::io::Result<Self> {
        Self::new("credentials.ini", contents)
    }

    /// An `odbcinst.ini` declaring the given drivers.
    pub fn odbcinst(drivers: &[&str]) -> std::io::Result<Self> {
        let mut contents = String::from("[ODBC Drivers]\n");
        for driver in drivers {
            let _ = writeln!(contents, "{driver} = Installed");
        }
        for driver in drivers {
            let _ = write!(
                contents,
                "\n[{driver}]\nDescription = {driver}\nDriver = /opt/drivers/lib{}.so\nUsageCount = 1\n",
                driver.to_lowercase().replace(' ', "_")
            );
        }
        Self::new("odbcinst.ini", &contents)
    }

    /// Path of the written file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the file.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Render one credentials section.
#[must_use]
pub fn service_principal_section(
    name: &str,
    tenant_id: &str,
    client_id: &str,
    client_secret: &str,
) -> String {
    format!(
        "[{name}]\ntenant_id = {tenant_id}\nclient_id = {client_id}\nclient_secret = {client_secret}\n"
    )
}
