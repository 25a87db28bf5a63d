//! Collection configuration and exclusion rules.

use derive_builder::Builder;
use globset::{Glob, GlobMatcher};
use regex::Regex;

/// A rule tested against the bare name of every listed entry.
#[derive(Debug, Clone)]
pub enum ExcludePattern {
    /// Exact name match.
    Literal { name: String, ignore_case: bool },
    /// Regular expression, matched anywhere in the name unless anchored.
    Regex(Regex),
    /// Shell-style glob over the whole name.
    Glob(GlobMatcher),
}

impl ExcludePattern {
    /// Exact, case-sensitive name.
    pub fn literal(name: impl Into<String>) -> Self {
        Self::Literal {
            name: name.into(),
            ignore_case: false,
        }
    }

    /// Exact name compared without regard to ASCII case.
    pub fn literal_ignore_case(name: impl Into<String>) -> Self {
        Self::Literal {
            name: name.into(),
            ignore_case: true,
        }
    }

    /// Compile a regular expression.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Regex)
    }

    /// Compile a glob such as `*.log`.
    pub fn glob(pattern: &str) -> Result<Self, globset::Error> {
        Glob::new(pattern).map(|g| Self::Glob(g.compile_matcher()))
    }

    /// Test a bare entry name.
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Self::Literal {
                name,
                ignore_case: false,
            } => candidate == name,
            Self::Literal {
                name,
                ignore_case: true,
            } => candidate.eq_ignore_ascii_case(name),
            Self::Regex(re) => re.is_match(candidate),
            Self::Glob(glob) => glob.is_match(candidate),
        }
    }
}

/// Names that are never uploaded unless `include_hidden` is set.
pub fn default_exclude_patterns() -> Vec<ExcludePattern> {
    vec![
        ExcludePattern::literal(".git"),
        ExcludePattern::literal(".DS_Store"),
        ExcludePattern::literal("node_modules"),
        ExcludePattern::literal_ignore_case("thumbs.db"),
        ExcludePattern::literal_ignore_case("desktop.ini"),
        ExcludePattern::literal_ignore_case(crate::manifest::MANIFEST_FILE_NAME),
    ]
}

/// Check a name against a set of rules.
pub fn is_excluded(name: &str, patterns: &[ExcludePattern]) -> bool {
    patterns.iter().any(|p| p.matches(name))
}

/// Configuration for collecting a directory tree.
#[derive(Debug, Clone, Default, Builder)]
#[builder(setter(into))]
pub struct CollectConfig {
    /// Caller supplied exclusion rules (None = defaults).
    #[builder(default, setter(into, strip_option))]
    pub exclude_patterns: Option<Vec<ExcludePattern>>,

    /// Maximum recursion depth, root = 0 (None = unlimited).
    #[builder(default, setter(into, strip_option))]
    pub max_depth: Option<u32>,

    /// Let the caller's rules replace the defaults instead of extending them.
    #[builder(default = "false")]
    pub include_hidden: bool,
}

impl CollectConfig {
    /// Create a new config builder.
    pub fn builder() -> CollectConfigBuilder {
        CollectConfigBuilder::default()
    }

    /// Rules actually applied during a walk.
    ///
    /// Unless `include_hidden` is set the defaults are always part of the
    /// result, whatever the caller supplied.
    pub fn effective_patterns(&self) -> Vec<ExcludePattern> {
        match (&self.exclude_patterns, self.include_hidden) {
            (Some(custom), true) => custom.clone(),
            (None, true) => default_exclude_patterns(),
            (custom, false) => {
                let mut patterns = default_exclude_patterns();
                patterns.extend(custom.iter().flatten().cloned());
                patterns
            }
        }
    }

    /// Check if a walk at `depth` may still list its directory.
    pub fn allows_depth(&self, depth: u32) -> bool {
        self.max_depth.is_none_or(|max| depth <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = CollectConfig::builder()
            .max_depth(2u32)
            .exclude_patterns(vec![ExcludePattern::literal("target")])
            .build()
            .unwrap();

        assert_eq!(config.max_depth, Some(2));
        assert!(!config.include_hidden);
        assert!(config.allows_depth(2));
        assert!(!config.allows_depth(3));
    }

    #[test]
    fn test_defaults_unbounded() {
        let config = CollectConfig::default();
        assert!(config.allows_depth(u32::MAX));
        assert_eq!(config.effective_patterns().len(), 6);
    }

    #[test]
    fn test_literal_case_rules() {
        let patterns = default_exclude_patterns();
        assert!(is_excluded("node_modules", &patterns));
        assert!(!is_excluded("Node_Modules", &patterns));
        assert!(is_excluded("Thumbs.DB", &patterns));
        assert!(is_excluded("MANIFEST.json", &patterns));
        assert!(!is_excluded("src", &patterns));
    }

    #[test]
    fn test_regex_and_glob() {
        let re = ExcludePattern::regex(r"\.tmp$").unwrap();
        assert!(re.matches("build.tmp"));
        assert!(!re.matches("build.tmpl"));

        let glob = ExcludePattern::glob("*.log").unwrap();
        assert!(glob.matches("server.log"));
        assert!(!glob.matches("server.log.gz"));
    }

    #[test]
    fn test_defaults_survive_custom_rules() {
        let config = CollectConfig::builder()
            .exclude_patterns(vec![ExcludePattern::literal("dist")])
            .build()
            .unwrap();
        let patterns = config.effective_patterns();
        assert!(is_excluded("node_modules", &patterns));
        assert!(is_excluded("dist", &patterns));
    }

    #[test]
    fn test_include_hidden_replaces_defaults() {
        let config = CollectConfig::builder()
            .exclude_patterns(vec![ExcludePattern::literal("dist")])
            .include_hidden(true)
            .build()
            .unwrap();
        let patterns = config.effective_patterns();
        assert!(!is_excluded(".git", &patterns));
        assert!(is_excluded("dist", &patterns));
    }
}
