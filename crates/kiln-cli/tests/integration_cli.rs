//! Tests for the `kiln` binary.
//!
//! The release build tests use shell scripts standing in for esbuild and
//! sass, so they only run on unix.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn kiln() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_kiln"));
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help_lists_commands() {
    kiln()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("dev"))
        .stdout(predicate::str::contains("build"));
}

#[test]
fn test_dev_without_entry_fails() {
    let temp = TempDir::new().unwrap();

    kiln()
        .args(["dev", "--cwd"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Entry point not found"));
}

#[test]
fn test_invalid_config_value_fails() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("kiln.config.json"), r#"{ "port": "eighty" }"#).unwrap();

    kiln()
        .args(["build", "--cwd"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("port"));
}

#[test]
fn test_unknown_config_field_fails() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("kiln.config.json"), r#"{ "outdir": "dist" }"#).unwrap();

    kiln()
        .args(["build", "--cwd"])
        .arg(temp.path())
        .assert()
        .failure();
}

#[cfg(unix)]
mod release {
    use super::kiln;
    use predicates::prelude::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn project() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::create_dir_all(temp.path().join("public/styles")).unwrap();
        fs::write(temp.path().join("src/app.tsx"), "export {}").unwrap();
        fs::write(
            temp.path().join("public/index.html"),
            "<html><body></body></html>",
        )
        .unwrap();
        temp
    }

    #[test]
    fn test_release_build_with_stand_in_tools() {
        let temp = project();
        let root = temp.path();

        let tools = TempDir::new().unwrap();
        let esbuild = write_script(
            tools.path(),
            "esbuild",
            r#"for arg in "$@"; do
  case "$arg" in
    --outdir=*) out="${arg#--outdir=}" ;;
    --metafile=*) meta="${arg#--metafile=}" ;;
    --minify) minify=1 ;;
  esac
done
[ -n "$minify" ] || { echo "expected --minify" >&2; exit 1; }
mkdir -p "$out" "$(dirname "$meta")"
printf 'x' > "$out/app.js"
printf '{"outputs":{"dist/js/app.js":{"bytes":1}}}' > "$meta""#,
        );
        let sass = write_script(
            tools.path(),
            "sass",
            r#"for arg in "$@"; do last="$arg"; done
mkdir -p "${last#*:}""#,
        );

        fs::write(
            root.join("kiln.config.json"),
            serde_json::json!({ "esbuild": esbuild, "sass": sass }).to_string(),
        )
        .unwrap();

        kiln().args(["build", "--cwd"]).arg(root).assert().success();

        assert!(root.join("dist/js/app.js").is_file());
        assert!(root.join("dist/css").is_dir());
        assert!(root.join("dist/index.html").is_file());
        assert!(!root.join("dist/.kiln-meta.json").exists());
    }

    #[test]
    fn test_release_build_reports_bundle_errors() {
        let temp = project();
        let root = temp.path();

        let tools = TempDir::new().unwrap();
        let esbuild = write_script(
            tools.path(),
            "esbuild",
            r#"cat >&2 <<'LOG'
✘ [ERROR] Expected ";" but found "}"

    src/app.tsx:1:8:
      1 │ export {
        ╵         ^

1 error
LOG
exit 1"#,
        );

        fs::write(
            root.join("kiln.config.json"),
            serde_json::json!({ "esbuild": esbuild, "styles": false }).to_string(),
        )
        .unwrap();

        kiln()
            .args(["build", "--cwd"])
            .arg(root)
            .assert()
            .failure()
            .stderr(predicate::str::contains("src/app.tsx:1:8"))
            .stderr(predicate::str::contains("Release build failed"));
    }
}
