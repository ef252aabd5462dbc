//! Content and layout checks of rendered output against source data.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{AuditMetrics, AuditReport, GeometryDocument, Profile, DEFAULT_ROOT_NAME};
use crate::parser::GeometryExtractor;
use crate::text::{partial_ratio, Normalizer};

use super::guard::SourceGuard;
use super::options::AuditOptions;

/// A labeled source value the rendered output must contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntity {
    /// Location in the profile, e.g. `Exp[0].bullets[2]`
    pub label: String,

    /// The raw value
    pub value: String,
}

/// Collect every non-empty string the audit checks, in profile order.
///
/// `name` is labeled `Name`; string leaves under `experience` entries and
/// `custom_sections` are labeled `Exp[i].key` and `Custom[i].key`, with
/// list items suffixed `[j]`.
pub fn source_entities(profile: &Profile) -> Vec<SourceEntity> {
    let mut entities = Vec::new();

    if let Some(name) = profile.name() {
        push_entity(&mut entities, "Name".to_string(), name);
    }
    for (i, entry) in profile.experience().iter().enumerate() {
        walk_entry(&mut entities, &format!("Exp[{}]", i), entry);
    }
    for (i, section) in profile.custom_sections().iter().enumerate() {
        walk_entry(&mut entities, &format!("Custom[{}]", i), section);
    }

    entities
}

fn walk_entry(out: &mut Vec<SourceEntity>, prefix: &str, entry: &Value) {
    match entry {
        Value::Object(map) => {
            for (key, value) in map {
                walk(out, format!("{}.{}", prefix, key), value);
            }
        }
        other => walk(out, prefix.to_string(), other),
    }
}

fn walk(out: &mut Vec<SourceEntity>, label: String, value: &Value) {
    match value {
        Value::String(s) => push_entity(out, label, s),
        Value::Array(items) => {
            for (j, item) in items.iter().enumerate() {
                walk(out, format!("{}[{}]", label, j), item);
            }
        }
        Value::Object(map) => {
            for (key, nested) in map {
                walk(out, format!("{}.{}", label, key), nested);
            }
        }
        _ => {}
    }
}

fn push_entity(out: &mut Vec<SourceEntity>, label: String, value: &str) {
    if !value.trim().is_empty() {
        out.push(SourceEntity {
            label,
            value: value.to_string(),
        });
    }
}

/// Verifies that rendered geometry preserves a profile.
#[derive(Debug, Clone, Default)]
pub struct FidelityAuditor {
    options: AuditOptions,
    normalizer: Normalizer,
}

impl FidelityAuditor {
    /// Create an auditor.
    pub fn new(options: AuditOptions) -> Self {
        Self {
            options,
            normalizer: Normalizer::default(),
        }
    }

    /// Replace the normalizer.
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Options in effect.
    pub fn options(&self) -> &AuditOptions {
        &self.options
    }

    /// Audit a profile against extracted geometry.
    pub fn audit(&self, profile: &Profile, geometry: &GeometryDocument) -> AuditReport {
        let raw_full = geometry.concatenated_text();
        let full = self.normalizer.normalize(&raw_full);
        let raw_lower = raw_full.to_lowercase();

        let entities = source_entities(profile);
        let mut issues = Vec::new();

        for entity in &entities {
            let needle = self.normalizer.normalize(&entity.value);
            if needle.is_empty() || full.contains(&needle) {
                continue;
            }

            let score = partial_ratio(&entity.value.to_lowercase(), &raw_lower);
            log::debug!("{} not found verbatim, fuzzy score {:.1}", entity.label, score);
            if score < self.options.fuzzy_threshold {
                issues.push(format!(
                    "MISSING CONTENT [{}]: '{}' (Fuzzy: {:.1})",
                    entity.label, entity.value, score
                ));
            }
        }

        if let Some(name) = profile.name() {
            if let Some(issue) = self.check_drift(name, geometry) {
                issues.push(issue);
            }
        }

        let metrics = AuditMetrics {
            target_word_count: geometry.word_count(),
            source_entity_count: entities.len(),
        };
        log::info!(
            "Audit checked {} entities against {} words: {} issue(s)",
            metrics.source_entity_count,
            metrics.target_word_count,
            issues.len()
        );

        AuditReport::new(issues, metrics)
    }

    /// Audit source JSON (optionally wrapped in a `resume` root) against geometry.
    pub fn audit_value(&self, source: &Value, geometry: &GeometryDocument) -> Result<AuditReport> {
        let profile = Profile::from_value(source.clone(), DEFAULT_ROOT_NAME)
            .ok_or_else(|| Error::Schema("profile root must be a JSON object".into()))?;
        Ok(self.audit(&profile, geometry))
    }

    /// Audit a source JSON file against a rendered PDF.
    ///
    /// The source path is checked against the sandbox before it is read.
    pub fn audit_files<S: AsRef<Path>, P: AsRef<Path>>(&self, source: S, pdf: P) -> Result<AuditReport> {
        let checked = self.guard()?.check(source.as_ref())?;
        let json = fs::read_to_string(&checked.path)?;
        let profile = Profile::from_json(&json, DEFAULT_ROOT_NAME)?;

        let geometry =
            GeometryExtractor::open_with_options(pdf.as_ref(), self.options.geometry.clone())?
                .extract()?;
        Ok(self.audit(&profile, &geometry))
    }

    /// Audit many `(source, pdf)` pairs in parallel.
    ///
    /// Each pair yields its own result in input order.
    pub fn audit_batch(&self, jobs: &[(PathBuf, PathBuf)]) -> Vec<Result<AuditReport>> {
        jobs.par_iter()
            .map(|(source, pdf)| self.audit_files(source, pdf))
            .collect()
    }

    fn guard(&self) -> Result<SourceGuard> {
        let root = match &self.options.sandbox_root {
            Some(root) => root.clone(),
            None => std::env::current_dir()?,
        };
        SourceGuard::new(root, &self.options.canonical_dir)
    }

    fn check_drift(&self, name: &str, geometry: &GeometryDocument) -> Option<String> {
        let needle = self.normalizer.normalize(name);
        if needle.is_empty() {
            return None;
        }

        let tops: Vec<f32> = geometry
            .lines()
            .filter(|line| self.normalizer.normalize(&line.text).contains(&needle))
            .map(|line| line.top)
            .collect();
        if tops.is_empty() {
            return None;
        }

        let avg_top = tops.iter().sum::<f32>() / tops.len() as f32;
        (avg_top > self.options.drift_threshold).then(|| {
            format!(
                "GEOMETRIC DRIFT: Name '{}' found at Y={:.1} (Expected < {})",
                name, avg_top, self.options.drift_threshold
            )
        })
    }
}

/// Audit a profile against geometry with default thresholds.
pub fn audit(profile: &Profile, geometry: &GeometryDocument) -> AuditReport {
    FidelityAuditor::default().audit(profile, geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AuditStatus, GeoLine, GeoPage, GeoToken};
    use crate::parser::group_lines;
    use serde_json::json;

    fn token(text: &str, x0: f32, top: f32) -> GeoToken {
        GeoToken {
            text: text.to_string(),
            x0,
            top,
            size: 10.0,
            font: "EBGaramond-Regular".to_string(),
            page: 1,
        }
    }

    fn geometry(words: &[(&str, f32, f32)]) -> GeometryDocument {
        let mut page = GeoPage::new(1, 612.0, 792.0);
        page.tokens = words.iter().map(|(t, x, y)| token(t, *x, *y)).collect();
        page.lines = group_lines(&page.tokens, 3.0);
        let mut doc = GeometryDocument::new();
        doc.pages.push(page);
        doc
    }

    fn profile(value: Value) -> Profile {
        Profile::from_value(value, DEFAULT_ROOT_NAME).unwrap()
    }

    #[test]
    fn test_pass() {
        let geo = geometry(&[("Jane", 72.0, 60.0), ("Doe", 110.0, 60.0), ("Acme", 72.0, 200.0)]);
        let report = audit(
            &profile(json!({"name": "Jane Doe", "experience": [{"company": "Acme"}]})),
            &geo,
        );

        assert_eq!(report.status(), AuditStatus::Pass);
        assert_eq!(report.integrity_score(), 100);
        assert_eq!(report.metrics().source_entity_count, 2);
        assert_eq!(report.metrics().target_word_count, 3);
    }

    #[test]
    fn test_missing_company() {
        let geo = geometry(&[("Jane", 72.0, 60.0), ("Doe", 110.0, 60.0), ("Initech", 72.0, 200.0)]);
        let report = audit(
            &profile(json!({"name": "Jane Doe", "experience": [{"company": "Acme"}]})),
            &geo,
        );

        assert_eq!(report.status(), AuditStatus::Fail);
        assert_eq!(report.issues().len(), 1);
        assert!(report.issues()[0].starts_with("MISSING CONTENT [Exp[0].company]: 'Acme' (Fuzzy: "));
        assert_eq!(report.integrity_score(), 95);
    }

    #[test]
    fn test_geometric_drift() {
        let geo = geometry(&[("Jane", 72.0, 400.0), ("Doe", 110.0, 400.0)]);
        let report = audit(&profile(json!({"name": "Jane Doe"})), &geo);

        assert_eq!(
            report.issues(),
            &["GEOMETRIC DRIFT: Name 'Jane Doe' found at Y=400.0 (Expected < 150)".to_string()]
        );
    }

    #[test]
    fn test_fuzzy_tolerates_small_typo() {
        // "Enginer" is not a substring but scores above 85.
        let geo = geometry(&[("Jane", 72.0, 60.0), ("Doe", 110.0, 60.0), ("Senior", 72.0, 200.0), ("Enginer", 120.0, 200.0)]);
        let report = audit(
            &profile(json!({"name": "Jane Doe", "experience": [{"title": "Senior Engineer"}]})),
            &geo,
        );
        assert!(report.passed(), "{:?}", report.issues());
    }

    #[test]
    fn test_entity_labels() {
        let entities = source_entities(&profile(json!({
            "name": "Jane Doe",
            "experience": [{"company": "Acme", "bullets": ["Shipped", "", "Led"]}],
            "custom_sections": [{"title": "Awards", "content": ["Best Paper"]}],
        })));
        let mut labels: Vec<&str> = entities.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels[0], "Name");

        labels.sort_unstable();
        assert_eq!(
            labels,
            vec![
                "Custom[0].content[0]",
                "Custom[0].title",
                "Exp[0].bullets[0]",
                "Exp[0].bullets[2]",
                "Exp[0].company",
                "Name",
            ]
        );
    }

    #[test]
    fn test_escape_artifacts_do_not_fail() {
        let geo = geometry(&[("Jane", 72.0, 60.0), ("Doe", 110.0, 60.0), ("R&D", 72.0, 200.0), ("|", 100.0, 200.0), ("Ops", 110.0, 200.0)]);
        let report = audit(
            &profile(json!({"name": "Jane Doe", "experience": [{"team": "R&D | Ops"}]})),
            &geo,
        );
        assert!(report.passed());
    }

    #[test]
    fn test_audit_files_rejects_escaping_source() {
        let dir = tempfile::tempdir().unwrap();
        let auditor = FidelityAuditor::new(AuditOptions::new().with_sandbox_root(dir.path()));
        let err = auditor
            .audit_files("../../etc/passwd", dir.path().join("out.pdf"))
            .unwrap_err();
        assert!(matches!(err, Error::PathSecurity { .. }));
    }

    #[test]
    fn test_drift_ignores_unrelated_lines() {
        let line = GeoLine::from_tokens(&[token("Doe", 72.0, 500.0)]).unwrap();
        let mut geo = geometry(&[("Jane", 72.0, 60.0), ("Doe", 110.0, 60.0)]);
        geo.pages[0].lines.push(line);
        assert!(audit(&profile(json!({"name": "Jane Doe"})), &geo).passed());
    }
}
