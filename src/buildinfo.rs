//! Build metadata reported by `--version`.
//!
//! `APP_GIT_COMMIT` and `APP_BUILD_DATE` are read from the compile-time
//! environment when the release pipeline sets them.

use std::sync::OnceLock;

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How the binary was compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Dev,
    Release,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Dev => "dev",
            Mode::Release => "release",
        }
    }
}

pub fn mode() -> Mode {
    if cfg!(debug_assertions) {
        Mode::Dev
    } else {
        Mode::Release
    }
}

pub fn commit() -> &'static str {
    option_env!("APP_GIT_COMMIT").unwrap_or("unknown")
}

pub fn build_date() -> &'static str {
    option_env!("APP_BUILD_DATE").unwrap_or("unknown")
}

/// `0.1.0 (2026-10-17) [mode: release, commit: abc1234]`
pub fn short() -> &'static str {
    static SHORT: OnceLock<String> = OnceLock::new();
    SHORT.get_or_init(|| {
        format!(
            "{} ({}) [mode: {}, commit: {}]",
            VERSION,
            build_date(),
            mode().as_str(),
            commit()
        )
    })
}

/// `short()` prefixed with the package name, for the startup log line.
pub fn full() -> String {
    format!("{} {}", NAME, short())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_carries_version_and_mode() {
        let short = short();
        assert!(short.starts_with(VERSION));
        assert!(short.contains(&format!("mode: {}", mode().as_str())));
        assert!(short.contains("commit: "));
    }

    #[test]
    fn test_full_is_prefixed_with_name() {
        assert_eq!(full(), format!("app-lifecycle {}", short()));
    }
}
