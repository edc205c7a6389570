//! Build metadata printed by `stress-test version`.
use std::fmt;

const COMMIT_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: &'static str,
    pub date: &'static str,
}

impl BuildInfo {
    /// Metadata baked in at compile time through `STRESS_TEST_COMMIT` and
    /// `STRESS_TEST_BUILD_DATE`.
    #[must_use]
    pub fn current() -> Self {
        Self::from_parts(
            env!("CARGO_PKG_VERSION"),
            option_env!("STRESS_TEST_COMMIT"),
            option_env!("STRESS_TEST_BUILD_DATE"),
        )
    }

    fn from_parts(version: &'static str, commit: Option<&'static str>, date: Option<&'static str>) -> Self {
        let commit = commit
            .map(str::trim)
            .filter(|commit| !commit.is_empty())
            .map_or("none", |commit| commit.get(..COMMIT_LEN).unwrap_or(commit));
        let date = date
            .map(str::trim)
            .filter(|date| !date.is_empty())
            .unwrap_or("unknown");
        Self {
            version,
            commit,
            date,
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "version: {}", self.version)?;
        writeln!(f, "commit: {}", self.commit)?;
        write!(f, "date: {}", self.date)
    }
}
