//! Integration tests for the soldeploy CLI

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn soldeploy(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_soldeploy"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute soldeploy")
}

fn write_package(dir: &Path, file_name: &str, name: &str, version: &str) -> PathBuf {
    let path = dir.join(file_name);
    let mut zip = zip::ZipWriter::new(std::fs::File::create(&path).unwrap());
    zip.start_file("solution.xml", SimpleFileOptions::default())
        .unwrap();
    write!(
        zip,
        "<ImportExportXml><SolutionManifest><UniqueName>{name}</UniqueName>\
         <Version>{version}</Version></SolutionManifest></ImportExportXml>"
    )
    .unwrap();
    zip.finish().unwrap();
    path
}

fn write_config(dir: &Path, packages: &[&str]) -> PathBuf {
    let mut contents = String::from("[pipeline]\nupgrade_api = \"legacy\"\n");
    for (i, package) in packages.iter().enumerate() {
        contents.push_str(&format!(
            "\n[[packages]]\npath = \"{package}\"\ninstall_order = {}\n",
            i + 1
        ));
    }
    let path = dir.join("deploy.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn test_cli_version() {
    let output = soldeploy(&["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("soldeploy"));
}

#[test]
fn test_cli_help() {
    let output = soldeploy(&["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Staged deployment of versioned solution packages"));
    for command in ["inspect", "stage", "validate", "deploy"] {
        assert!(stdout.contains(command), "missing {command}");
    }
}

#[test]
fn test_cli_invalid_command() {
    let output = soldeploy(&["invalid-command"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn test_deploy_requires_catalog() {
    let output = soldeploy(&["deploy"]);
    assert!(!output.status.success());
}

#[test]
fn test_inspect_json() {
    let dir = TempDir::new().unwrap();
    let package = write_package(dir.path(), "Core_2_0_0.zip", "Core", "2.0.0");
    let config = write_config(dir.path(), &[]);

    let output = soldeploy(&[
        "--json",
        "--config",
        config.to_str().unwrap(),
        "inspect",
        package.to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let value = json(&output);
    assert_eq!(value["type"], "PackageInfo");
    assert_eq!(value["data"]["unique_name"], "Core");
    assert_eq!(value["data"]["version"], "2.0.0");
    assert_eq!(value["data"]["holding_name"], "Core_Upgrade");
}

#[test]
fn test_stage_writes_holding_copy() {
    let dir = TempDir::new().unwrap();
    let package = write_package(dir.path(), "Core.zip", "Core", "2.0.0");
    let config = write_config(dir.path(), &[]);

    let output = soldeploy(&[
        "--config",
        config.to_str().unwrap(),
        "stage",
        package.to_str().unwrap(),
    ]);

    assert!(output.status.success());
    assert!(dir.path().join("Core_Upgrade.zip").exists());
}

#[test]
fn test_validate_prints_plan_in_install_order() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &["Core.zip", "Addon.zip"]);

    let output = soldeploy(&["--json", "--config", config.to_str().unwrap(), "validate"]);

    assert!(output.status.success());
    let value = json(&output);
    assert_eq!(value["type"], "Plan");
    let entries = value["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0]["path"].as_str().unwrap().ends_with("Core.zip"));
    assert!(entries[1]["path"].as_str().unwrap().ends_with("Addon.zip"));
}

#[test]
fn test_deploy_against_local_catalog() {
    let dir = TempDir::new().unwrap();
    write_package(dir.path(), "Core.zip", "Core", "2.0.0");
    let config = write_config(dir.path(), &["Core.zip"]);
    let catalog = dir.path().join("catalog");

    let output = soldeploy(&[
        "--json",
        "--config",
        config.to_str().unwrap(),
        "deploy",
        "--catalog",
        catalog.to_str().unwrap(),
    ]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let value = json(&output);
    assert_eq!(value["type"], "Deployment");
    let phases = value["data"]["phases"].as_array().unwrap();
    assert_eq!(phases.len(), 3);
    assert_eq!(phases[0]["outcomes"][0]["action"]["action"], "imported");

    let state = std::fs::read_to_string(catalog.join("catalog.json")).unwrap();
    assert!(state.contains("\"Core\""));
}

#[test]
fn test_deploy_without_packages_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &[]);
    let catalog = dir.path().join("catalog");

    let output = soldeploy(&[
        "--config",
        config.to_str().unwrap(),
        "deploy",
        "--catalog",
        catalog.to_str().unwrap(),
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no packages configured"));
}
