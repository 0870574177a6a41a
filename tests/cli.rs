use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

fn write_file(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn distill(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_distill"))
        .args(args)
        .env_remove("DISTILL_LOG")
        .output()
        .unwrap()
}

fn write_shop(root: &Path) {
    write_file(&root.join("__init__.py"), "");
    write_file(
        &root.join("main.py"),
        "from shop import models\nfrom shop import db\n\n\ndef run():\n    models.User()\n",
    );
    write_file(
        &root.join("models.py"),
        "from . import db\n\n\nclass User:\n    pass\n",
    );
    write_file(&root.join("db.py"), "def connect():\n    return None\n");
}

#[test]
fn cli_compress_single_file_prints_python() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("calc.py");
    write_file(
        &file,
        "import math\n\n\ndef add(a, b):\n    \"\"\"Sum.\"\"\"\n    return a + b\n",
    );

    let output = distill(&["compress", file.to_str().unwrap()]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout,
        "def add(a, b):\n    \"<Content purposely removed: 2 lines>\"\n"
    );
}

#[test]
fn cli_compress_flags_and_config() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("calc.py");
    write_file(
        &file,
        "import math\n\n\ndef add(a, b):\n    \"\"\"Sum.\"\"\"\n    return a + b\n",
    );
    let config = dir.path().join("distill.toml");
    write_file(&config, "[compress]\ninclude_line_count = false\n");

    let output = distill(&[
        "compress",
        file.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--keep-docstrings",
        "--keep-imports",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout,
        "import math\n\ndef add(a, b):\n    \"\"\"Sum.\"\"\"\n    \"<Content purposely removed>\"\n"
    );
}

#[test]
fn cli_compress_json_keeps_input_order() {
    let dir = tempdir().unwrap();
    let b = dir.path().join("b.py");
    let a = dir.path().join("a.py");
    write_file(&b, "class B:\n    x = 1\n\n    def f(self):\n        return self.x\n");
    write_file(&a, "VALUE = 1\n");

    let output = distill(&["compress", b.to_str().unwrap(), a.to_str().unwrap(), "--json"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let files = v.as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert!(files[0]["path"].as_str().unwrap().ends_with("b.py"));
    assert_eq!(
        files[0]["content"],
        "class B:\n    x = 1\n    \"<Content purposely removed: 3 lines>\"\n"
    );
    assert!(files[1]["path"].as_str().unwrap().ends_with("a.py"));
    assert_eq!(files[1]["content"], "VALUE = 1\n");
}

#[test]
fn cli_compress_parse_error() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("broken.py");
    write_file(&file, "def broken(:\n    pass\n");

    let output = distill(&["compress", file.to_str().unwrap(), "--json"]);
    assert_eq!(output.status.code(), Some(6));

    let stderr = String::from_utf8(output.stderr).unwrap();
    let v: serde_json::Value = serde_json::from_str(stderr.trim()).unwrap();
    assert!(v["error"].as_str().unwrap().contains("broken.py"));
    assert_eq!(v["code"], 6);
}

#[test]
fn cli_compress_missing_file() {
    let output = distill(&["compress", "/nonexistent/file.py"]);
    assert_eq!(output.status.code(), Some(3));

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.starts_with("error: path not found"));
}

#[test]
fn cli_rank_orders_by_importance() {
    let dir = tempdir().unwrap();
    let shop = dir.path().join("shop");
    write_shop(&shop);

    let output = distill(&["rank", shop.to_str().unwrap(), "--json"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let names: Vec<&str> = v
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["shop.main", "shop.models", "shop.db", "shop"]);

    assert_eq!(v[0]["importance"], 1080);
    assert_eq!(v[1]["imports"][0], "shop.db");
    assert_eq!(v[2]["imported_in"].as_array().unwrap().len(), 2);
}

#[test]
fn cli_rank_respects_distillignore_and_hidden() {
    let dir = tempdir().unwrap();
    let shop = dir.path().join("shop");
    write_shop(&shop);
    write_file(&shop.join("legacy.py"), "import shop.db\n");
    write_file(&shop.join(".scratch.py"), "import shop.db\n");
    write_file(&shop.join(".distillignore"), "legacy.py\n");

    let output = distill(&["rank", shop.to_str().unwrap(), "--json"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let paths: Vec<&str> = v
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["path"].as_str().unwrap())
        .collect();

    assert_eq!(paths.len(), 4);
    assert!(!paths.iter().any(|p| p.ends_with("legacy.py")));
    assert!(!paths.iter().any(|p| p.ends_with(".scratch.py")));
}

#[test]
fn cli_rank_no_gitignore_scans_ignored_files() {
    let dir = tempdir().unwrap();
    let shop = dir.path().join("shop");
    write_shop(&shop);
    fs::create_dir(shop.join(".git")).unwrap();
    write_file(&shop.join(".gitignore"), "db.py\n");

    let count = |args: &[&str]| {
        let output = distill(args);
        assert!(output.status.success());
        let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        v.as_array().unwrap().len()
    };

    let root = shop.to_str().unwrap();
    assert_eq!(count(&["rank", root, "--json"]), 3);
    assert_eq!(count(&["rank", root, "--json", "--no-gitignore"]), 4);
}

#[test]
fn cli_rank_shares() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("big.py"), "x = 1\ny = 2\nz = 3\n");
    write_file(&dir.path().join("small.py"), "x = 1\n");

    let output = distill(&["rank", dir.path().to_str().unwrap(), "--shares", "--json"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(v[0]["path"].as_str().unwrap().ends_with("big.py"));
    assert_eq!(v[0]["length"], 18);
    assert_eq!(v[0]["percent"], 75.0);
    assert_eq!(v[1]["percent"], 25.0);
}

#[test]
fn cli_rank_empty_directory() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("README.md"), "# nothing\n");

    let output = distill(&["rank", dir.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn cli_completions() {
    let output = distill(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout).unwrap().contains("distill"));
}
