use std::{fs, path::PathBuf};

use serde_json::Value;
use tempfile::tempdir;

use wctl::{WctlError, config::GenerateConfig};
use wctl_cli::{Args, Command, GenerateArgs, generate, run};

/// The fixture schemas at the workspace root.
fn demos() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|crates| crates.parent())
        .expect("workspace root")
        .join("demos")
}

fn printer_args(input: PathBuf, output: PathBuf) -> GenerateArgs {
    GenerateArgs {
        input: input.to_string_lossy().to_string(),
        output: Some(output.to_string_lossy().to_string()),
        lang: vec!["printer".to_string()],
        ..GenerateArgs::default()
    }
}

fn read_json(path: PathBuf) -> Value {
    let data = fs::read(&path).unwrap_or_else(|err| panic!("{}: {err}", path.display()));
    serde_json::from_slice(&data).expect("valid JSON")
}

#[test]
fn e2e_smoke_test_native_schemas() {
    let out = tempdir().expect("Failed to create temp directory");
    let args = Args {
        command: Command::Generate(GenerateArgs {
            options: vec!["build.tag=smoke".to_string()],
            ..printer_args(demos().join("schemas"), out.path().to_path_buf())
        }),
        config: None,
        log_level: "off".to_string(),
    };

    run(&args).expect("Valid schemas failed");

    let user = read_json(out.path().join("user.wproto.json"));
    assert_eq!(user["package"]["package"], "user");
    assert_eq!(user["options"]["go.pkg"]["Str"], "example.com/demo/user");
    assert_eq!(user["options"]["build.tag"]["Str"], "smoke");

    let status = &user["messages"][0]["fields"][4]["ty"];
    assert_eq!(status["kind"], "Custom");
    assert_eq!(status["key"], "common.status");

    let reply = &user["services"][0]["methods"][0]["reply"];
    assert_eq!(reply["name"], "user");
    assert_eq!(reply["fields"][0]["ty"]["msg"]["name"], "user");

    let types = read_json(out.path().join("common/types.wproto.json"));
    assert_eq!(types["enums"][0]["values"][2]["value"], 5);
}

#[test]
fn e2e_smoke_test_protobuf_schema() {
    let out = tempdir().expect("Failed to create temp directory");
    let args = GenerateArgs {
        files: vec!["greeter.proto".to_string()],
        ..printer_args(demos().join("schemas"), out.path().to_path_buf())
    };

    let written = generate(&args, &GenerateConfig::default()).expect("Valid schema failed");
    assert_eq!(written, vec![out.path().join("greeter.proto.json")]);

    let greeter = read_json(out.path().join("greeter.proto.json"));
    assert_eq!(greeter["options"]["proto.gopkg"]["Str"], "example.com/demo/greeter");
    let again = &greeter["services"][0]["methods"][1]["request"];
    assert_eq!(again["name"], "greeter.HelloRequest");
    assert_eq!(again["fields"][1]["options"]["proto.signed"]["Int"], 1);
}

#[test]
fn e2e_invalid_schemas_fail() {
    for file in ["unresolved.wproto", "duplicate.wproto"] {
        let out = tempdir().expect("Failed to create temp directory");
        let args = GenerateArgs {
            files: vec![file.to_string()],
            ..printer_args(demos().join("invalid"), out.path().to_path_buf())
        };

        let err = generate(&args, &GenerateConfig::default()).unwrap_err();
        assert!(
            matches!(&err, WctlError::Parse { file: name, .. } if name == file),
            "{file}: unexpected error {err}"
        );
        assert!(!out.path().join(format!("{file}.json")).exists());
    }
}

#[test]
fn e2e_generator_required() {
    let args = GenerateArgs {
        input: demos().join("schemas").to_string_lossy().to_string(),
        ..GenerateArgs::default()
    };
    assert!(matches!(
        generate(&args, &GenerateConfig::default()),
        Err(WctlError::Config(_))
    ));
}
