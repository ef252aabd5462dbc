//! Full build runs against a stand-in TeX engine.

mod common;

use std::fs;
use std::path::Path;
use std::time::Duration;

use common::{resume_pdf, RESUME_JSON};
use vitae::{Error, Pipeline};

#[test]
fn test_pipeline_rejects_escaping_source() {
    let root = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new().with_sandbox_root(root.path());

    let err = pipeline
        .run("../../etc/passwd", root.path().join("cv.tex"))
        .unwrap_err();
    assert!(matches!(err, Error::PathSecurity { .. }));
}

#[test]
fn test_pipeline_audit_stage() {
    let data: serde_json::Value = serde_json::from_str(RESUME_JSON).unwrap();
    let (geometry, report) = Pipeline::new().audit(&data, &resume_pdf()).unwrap();

    assert_eq!(geometry.word_count(), 10);
    assert!(report.passed());
}

#[cfg(unix)]
fn engine(dir: &Path, name: &str, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

// Engines are written and run from a single test.
#[cfg(unix)]
#[test]
fn test_pipeline_with_stand_in_engine() {
    if std::env::var_os(vitae::toolchain::BINARY_ENV).is_some() {
        return;
    }

    let root = tempfile::tempdir().unwrap();
    let base = root.path();
    fs::create_dir_all(base.join("data/masters")).unwrap();
    fs::create_dir_all(base.join("templates")).unwrap();
    fs::create_dir_all(base.join("bin")).unwrap();
    fs::write(base.join("data/masters/jane.json"), RESUME_JSON).unwrap();
    fs::write(
        base.join("templates/cv.tex"),
        r"\name{((( resume.name )))}((% for job in resume.experience %)) \company{((( job.company )))}((% endfor %))",
    )
    .unwrap();
    let fixture = base.join("bin/fixture.pdf");
    fs::write(&fixture, resume_pdf()).unwrap();

    // Copies the fixture PDF and records what it was given.
    let ok = engine(
        &base.join("bin"),
        "stand-in",
        &format!(
            r#"for a in "$@"; do case "$a" in -jobname=*) job="${{a#-jobname=}}";; *.tex) tex="$a";; esac; done
cp "{}" "$job.pdf"
{{ echo "TEXINPUTS=$TEXINPUTS"; cat "$tex"; }} > "$job.log""#,
            fixture.display()
        ),
    );

    let pipeline = Pipeline::new()
        .with_sandbox_root(base)
        .with_compile_options(
            vitae::CompileOptions::new()
                .with_binary(ok.clone())
                .with_keep_log(true),
        );
    let result = pipeline
        .run(base.join("data/masters/jane.json"), base.join("templates/cv.tex"))
        .unwrap();

    assert_eq!(result.latex, r"\name{Jane Doe} \company{Acme Corp}");
    assert!(result.pdf.starts_with(b"%PDF-1.5"));
    assert!(result.passed());
    assert_eq!(result.report.integrity_score(), 100);

    let log = result.log.clone().unwrap();
    assert!(log.contains(&format!("{}//:", base.join("templates").display())));
    assert!(log.contains(r"\company{Acme Corp}"));

    let out = base.join("jane.pdf");
    result.write_pdf(&out).unwrap();
    assert_eq!(fs::read(&out).unwrap(), resume_pdf());

    let failing = engine(
        &base.join("bin"),
        "failing",
        "echo '! LaTeX Error: File `moderncv.cls'\"'\"' not found.'\nexit 1",
    );
    let err = Pipeline::new()
        .with_sandbox_root(base)
        .with_binary(failing)
        .run(base.join("data/masters/jane.json"), base.join("templates/cv.tex"))
        .unwrap_err();
    match err {
        Error::Toolchain { stdout, .. } => assert!(stdout.contains("moderncv.cls")),
        other => panic!("unexpected error: {other}"),
    }

    // Succeeds only when a TEXINPUTS root holds the template's class file.
    let class_aware = engine(
        &base.join("bin"),
        "class-aware",
        r#"for a in "$@"; do case "$a" in -jobname=*) job="${a#-jobname=}";; esac; done
found=""
IFS=:
for d in $TEXINPUTS; do [ -f "${d%//}/resume.cls" ] && found="${d%//}"; done
[ -n "$found" ] || { echo "! LaTeX Error: File resume.cls not found."; exit 1; }
printf '%%PDF-1.4 fake' > "$job.pdf""#,
    );
    // Relative to the working directory, which the engine does not share.
    let local = tempfile::Builder::new()
        .prefix(".vitae-tpl")
        .tempdir_in(".")
        .unwrap();
    fs::create_dir_all(local.path().join("tpl")).unwrap();
    fs::write(local.path().join("tpl/resume.cls"), r"\ProvidesClass{resume}").unwrap();
    let template = local.path().join("tpl/cv.tex");
    assert!(template.is_relative());

    let compiled = Pipeline::new()
        .with_binary(class_aware)
        .compile(r"\documentclass{resume}", &template)
        .unwrap();
    assert!(compiled.pdf.starts_with(b"%PDF-1.4"));

    let stalled = engine(&base.join("bin"), "stalled", "sleep 5");
    let err = Pipeline::new()
        .with_sandbox_root(base)
        .with_binary(stalled)
        .with_timeout(Duration::from_millis(200))
        .run(base.join("data/masters/jane.json"), base.join("templates/cv.tex"))
        .unwrap_err();
    assert!(matches!(err, Error::ToolchainTimeout(_)));
}
