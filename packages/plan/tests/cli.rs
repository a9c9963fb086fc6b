use std::path::Path;

use blockwire_plan::cli::{run, Args};
use blockwire_plan::PlanError;
use clap::Parser;

const PLAN: &str = r#"{
    "blocks": [
        { "id": "auth",
          "resources": { "public": { "login.html": "<form/>" },
                         "private": { "secret": "hunter2" } } },
        { "id": "app", "resources": { "private": { "index.html": "app" } } }
    ],
    "instances": [
        { "name": "app", "block": "app", "wirings": { "auth": "auth" } },
        { "name": "auth", "block": "auth" }
    ]
}"#;

fn write_plan(dir: &Path, json: &str) -> String {
    let path = dir.join("plan.json");
    std::fs::write(&path, json).unwrap();
    path.to_string_lossy().into_owned()
}

fn run_with(args: &[&str]) -> Result<String, PlanError> {
    let args = Args::parse_from(std::iter::once("blockwire").chain(args.iter().copied()));
    let mut out = Vec::new();
    run(&args, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn deploys_and_resolves() {
    let dir = tempfile::tempdir().unwrap();
    let plan = write_plan(dir.path(), PLAN);

    let out = run_with(&[
        plan.as_str(),
        "--resolve",
        "app",
        "auth:login.html",
        "--resolve",
        "app",
        "auth:secret",
        "--resolve",
        "app",
        "index.html",
    ])
    .unwrap();

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "deployed app (block app) wirings [auth:]",
            "deployed auth (block auth) wirings []",
            "app auth:login.html -> auth:login.html (public) (7 bytes)",
            "app auth:secret -> not found",
            "app index.html -> app:index.html (private) (3 bytes)",
        ]
    );
}

#[test]
fn unknown_instance_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let plan = write_plan(dir.path(), PLAN);

    let err = run_with(&[plan.as_str(), "--resolve", "nobody", "x"]).unwrap_err();
    assert!(matches!(err, PlanError::UnknownInstance { ref instance, .. } if instance == "nobody"));
}

#[test]
fn invalid_plan_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let plan = write_plan(dir.path(), "{ not json");

    let err = run_with(&[plan.as_str()]).unwrap_err();
    assert!(matches!(err, PlanError::Json(_)));
}
