//! Output-directory naming, `hostname_YYYY-MM-DD_HH_MM_SS_pid`. Hostname
//! resolution is behind a trait so a host that needs genuine
//! `gethostname(2)` behavior can supply its own source, with an
//! environment-variable fallback here.

use chrono::Local;
use std::path::PathBuf;

pub trait HostnameSource: std::fmt::Debug {
    fn hostname(&self) -> String;
}

/// Reads `$HOSTNAME`, falling back to `"localhost"`.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvHostname;

impl HostnameSource for EnvHostname {
    fn hostname(&self) -> String {
        std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
    }
}

/// Builds and creates `base_dir/hostname_YYYY-MM-DD_HH_MM_SS_pid`.
pub fn make_result_dir(base_dir: &std::path::Path, hostname_source: &dyn HostnameSource) -> std::io::Result<PathBuf> {
    let hostname = hostname_source.hostname();
    let now = Local::now();
    let dir_name = format!("{hostname}_{}_{}", now.format("%Y-%m-%d_%H_%M_%S"), std::process::id());
    let path = base_dir.join(dir_name);
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_name_embeds_hostname_and_pid() {
        let dir = tempdir();
        let path = make_result_dir(&dir, &EnvHostname).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.contains(&std::process::id().to_string()));
        assert!(path.is_dir());
        std::fs::remove_dir_all(&dir).ok();
    }

    fn tempdir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mop-rs-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
