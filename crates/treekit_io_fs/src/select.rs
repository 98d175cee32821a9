//! File selection predicate compiled from [`SpecSelectionCriteria`].

use std::time::SystemTime;

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::handle::{HandleFile, MetaEntry};
use crate::spec::{EnumSelectCriterionMode, SpecSelectionCriteria, TreeOpError};

/// Compiled selection criteria; built once per tree operation.
#[derive(Debug, Clone, Default)]
pub struct SelectorFile {
    patterns_file_name: Option<Vec<GlobMatcher>>,
    regex_file_name: Option<Regex>,
    time_older_than: Option<SystemTime>,
    time_newer_than: Option<SystemTime>,
    mode_match: Option<u32>,
    rule_combine: EnumSelectCriterionMode,
}

impl SelectorFile {
    /// Compile raw criteria. Invalid globs/regexes fail here, before any IO.
    pub fn from_criteria(criteria: &SpecSelectionCriteria) -> Result<Self, TreeOpError> {
        Ok(Self {
            patterns_file_name: _compile_globs(criteria.patterns_file_name.as_deref())?,
            regex_file_name: _compile_regex(criteria.pattern_regex.as_deref())?,
            time_older_than: criteria.time_older_than,
            time_newer_than: criteria.time_newer_than,
            mode_match: criteria.mode_match.map(|m| m & 0o7777),
            rule_combine: criteria.rule_combine,
        })
    }

    /// Selector with no active field; admits every file.
    pub fn select_all() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.patterns_file_name.is_some()
            || self.regex_file_name.is_some()
            || self.time_older_than.is_some()
            || self.time_newer_than.is_some()
            || self.mode_match.is_some()
    }

    /// Evaluate the active fields against one file's name + metadata.
    ///
    /// With no active field every file matches, under AND and OR alike.
    pub fn matches(&self, name_file: &str, meta: &MetaEntry) -> bool {
        let l_results = [
            self.patterns_file_name
                .as_ref()
                .map(|l| l.iter().any(|p| p.is_match(name_file))),
            self.time_older_than
                .map(|t| meta.time_modified.is_some_and(|m| m < t)),
            self.time_newer_than
                .map(|t| meta.time_modified.is_some_and(|m| m > t)),
            self.mode_match.map(|mode| meta.mode & 0o7777 == mode),
            self.regex_file_name
                .as_ref()
                .map(|r| r.is_match(name_file)),
        ];

        let mut iter_active = l_results.into_iter().flatten().peekable();
        if iter_active.peek().is_none() {
            return true;
        }
        match self.rule_combine {
            EnumSelectCriterionMode::And => iter_active.all(|b| b),
            EnumSelectCriterionMode::Or => iter_active.any(|b| b),
        }
    }

    pub fn matches_file(&self, file: &HandleFile) -> bool {
        self.matches(file.name(), file.meta())
    }
}

fn _compile_globs(patterns: Option<&[String]>) -> Result<Option<Vec<GlobMatcher>>, TreeOpError> {
    let Some(patterns) = patterns else {
        return Ok(None);
    };

    let mut l_glob = Vec::with_capacity(patterns.len());
    for pattern in patterns.iter().filter(|p| !p.trim().is_empty()) {
        let matcher = Glob::new(pattern)
            .map_err(|e| {
                TreeOpError::InvalidPattern(format!("Invalid file name pattern {pattern:?}: {e}"))
            })?
            .compile_matcher();
        l_glob.push(matcher);
    }
    if l_glob.is_empty() {
        return Ok(None);
    }
    Ok(Some(l_glob))
}

fn _compile_regex(pattern: Option<&str>) -> Result<Option<Regex>, TreeOpError> {
    match pattern {
        None | Some("") => Ok(None),
        Some(pattern) => Regex::new(pattern).map(Some).map_err(|e| {
            TreeOpError::InvalidPattern(format!("Invalid file name regex {pattern:?}: {e}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::SelectorFile;
    use crate::handle::{EnumEntryKind, MetaEntry};
    use crate::spec::{EnumFileClass, EnumSelectCriterionMode, SpecSelectionCriteria, TreeOpError};

    fn meta_at(time_modified: SystemTime, mode: u32) -> MetaEntry {
        MetaEntry {
            kind: EnumEntryKind::File(EnumFileClass::Regular),
            size: 10,
            mode,
            time_modified: Some(time_modified),
        }
    }

    #[test]
    fn empty_criteria_selects_all_under_and_and_or() {
        let meta = meta_at(SystemTime::now(), 0o644);
        for rule_combine in [EnumSelectCriterionMode::And, EnumSelectCriterionMode::Or] {
            let criteria = SpecSelectionCriteria {
                rule_combine,
                patterns_file_name: Some(vec![String::new()]),
                ..SpecSelectionCriteria::default()
            };
            let selector = SelectorFile::from_criteria(&criteria).expect("compile");
            assert!(!selector.is_active());
            assert!(selector.matches("anything.bin", &meta));
        }
    }

    #[test]
    fn and_requires_every_active_field() {
        let t_now = SystemTime::now();
        let criteria = SpecSelectionCriteria {
            patterns_file_name: Some(vec!["*.txt".to_string()]),
            time_older_than: Some(t_now),
            ..SpecSelectionCriteria::default()
        };
        let selector = SelectorFile::from_criteria(&criteria).expect("compile");

        let meta_old = meta_at(t_now - Duration::from_secs(3600), 0o644);
        let meta_new = meta_at(t_now + Duration::from_secs(3600), 0o644);
        assert!(selector.matches("a.txt", &meta_old));
        assert!(!selector.matches("a.txt", &meta_new));
        assert!(!selector.matches("a.log", &meta_old));
    }

    #[test]
    fn or_accepts_any_active_field() {
        let criteria = SpecSelectionCriteria {
            patterns_file_name: Some(vec!["*.txt".to_string(), "*.md".to_string()]),
            pattern_regex: Some("^keep_".to_string()),
            rule_combine: EnumSelectCriterionMode::Or,
            ..SpecSelectionCriteria::default()
        };
        let selector = SelectorFile::from_criteria(&criteria).expect("compile");
        let meta = meta_at(SystemTime::now(), 0o644);
        assert!(selector.matches("notes.md", &meta));
        assert!(selector.matches("keep_me.bin", &meta));
        assert!(!selector.matches("drop_me.bin", &meta));
    }

    #[test]
    fn time_bounds_are_strict_and_mode_is_exact() {
        let t_ref = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let criteria = SpecSelectionCriteria {
            time_newer_than: Some(t_ref),
            ..SpecSelectionCriteria::default()
        };
        let selector = SelectorFile::from_criteria(&criteria).expect("compile");
        assert!(!selector.matches("f", &meta_at(t_ref, 0o644)));
        assert!(selector.matches("f", &meta_at(t_ref + Duration::from_secs(1), 0o644)));

        let criteria = SpecSelectionCriteria {
            mode_match: Some(0o600),
            ..SpecSelectionCriteria::default()
        };
        let selector = SelectorFile::from_criteria(&criteria).expect("compile");
        assert!(selector.matches("f", &meta_at(t_ref, 0o600)));
        assert!(!selector.matches("f", &meta_at(t_ref, 0o644)));
    }

    #[test]
    fn missing_mod_time_never_satisfies_age_bounds() {
        let criteria = SpecSelectionCriteria {
            time_older_than: Some(SystemTime::now()),
            ..SpecSelectionCriteria::default()
        };
        let selector = SelectorFile::from_criteria(&criteria).expect("compile");
        let meta = MetaEntry {
            time_modified: None,
            ..meta_at(SystemTime::now(), 0o644)
        };
        assert!(!selector.matches("f", &meta));
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        let criteria = SpecSelectionCriteria {
            patterns_file_name: Some(vec!["[".to_string()]),
            ..SpecSelectionCriteria::default()
        };
        let err = SelectorFile::from_criteria(&criteria).expect_err("must fail");
        assert!(matches!(err, TreeOpError::InvalidPattern(_)));

        let criteria = SpecSelectionCriteria {
            pattern_regex: Some("(".to_string()),
            ..SpecSelectionCriteria::default()
        };
        let err = SelectorFile::from_criteria(&criteria).expect_err("must fail");
        assert!(matches!(err, TreeOpError::InvalidPattern(_)));
    }
}
