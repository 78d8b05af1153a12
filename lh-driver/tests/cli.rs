//! End-to-end runs of the `lighthouse` binary

use indoc::indoc;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const UNPACK_UNIT: &str = indoc! {r#"
    {
      "tag": "unit",
      "attributes": {"language": "C", "filename": "unpack.c"},
      "children": [
        {"tag": "raw-source", "text": "void f(void)\n{\n  int *n;\n  dsUnpackList(a, b, c, \"i\", n);\n}\n"},
        {"tag": "referenced-types"},
        {"tag": "function-bodies", "children": [
          {"tag": "function", "attributes": {"name": "f", "location": "unpack.c:1"}, "children": [
            {"tag": "returns", "children": [{"tag": "void"}]},
            {"tag": "body", "attributes": {"entrypoint": "0"}, "children": [
              {"tag": "locals", "children": [
                {"tag": "decl", "children": [
                  {"tag": "binding", "attributes": {"id": "10", "name": "n"}},
                  {"tag": "type", "children": [{"tag": "addr-of", "children": [
                    {"tag": "integer", "attributes": {"name": "NUMBER_TYPE", "precision": "32"}}
                  ]}]}
                ]}
              ]},
              {"tag": "block", "attributes": {"id": "0"}, "children": [
                {"tag": "call", "attributes": {"location": "unpack.c:4:3"}, "children": [
                  {"tag": "function", "attributes": {"id": "900", "name": "dsUnpackList"}},
                  {"tag": "args", "children": [
                    {"tag": "bound", "attributes": {"id": "10"}},
                    {"tag": "bound", "attributes": {"id": "10"}},
                    {"tag": "bound", "attributes": {"id": "10"}},
                    {"tag": "constant", "children": [
                      {"tag": "array", "children": [
                        {"tag": "type", "children": [{"tag": "integer", "attributes": {"name": "char", "precision": "8"}}]}
                      ]},
                      {"tag": "string-literal", "text": "i"}
                    ]},
                    {"tag": "bound", "attributes": {"id": "10"}}
                  ]}
                ]},
                {"tag": "next", "attributes": {"id": "1"}}
              ]},
              {"tag": "block", "attributes": {"id": "1"}, "children": [{"tag": "return"}]}
            ]}
          ]}
        ]}
      ]
    }
"#};

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn write(&self, name: &str, text: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    fn unit(&self, name: &str, int_name: &str) -> PathBuf {
        self.write(name, &UNPACK_UNIT.replace("NUMBER_TYPE", int_name))
    }

    /// Run with manifests that point into the temporary directory
    fn run(&self, args: &[&str], documents: &[&Path]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_lighthouse"))
            .arg("--site-manifest")
            .arg(self.dir.path().join("site.json"))
            .arg("--user-manifest")
            .arg(self.dir.path().join("user.json"))
            .args(args)
            .args(documents)
            .env_remove("RUST_LOG")
            .output()
            .unwrap()
    }
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_clean_unit_succeeds() {
    let ws = Workspace::new();
    let unit = ws.unit("good.json", "int");
    let output = ws.run(&["--checker", "format-args"], &[&unit]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stderr(&output), "");
}

#[test]
fn test_mismatch_fails_with_diagnostic() {
    let ws = Workspace::new();
    let unit = ws.unit("bad.json", "long int");
    let output = ws.run(&["--checker", "format-args"], &[&unit]);
    assert_eq!(output.status.code(), Some(1));

    let text = stderr(&output);
    assert!(text.contains("not a \"int*\" as specified, but a \"long int*\""), "{text}");
    assert!(text.contains("^----- call-site"), "{text}");
    assert!(text.contains("1 error"), "{text}");
}

#[test]
fn test_checkers_from_user_manifest() {
    let ws = Workspace::new();
    ws.write("user.json", r#"{ "checkers": ["format-args"] }"#);
    let unit = ws.unit("bad.json", "long int");
    let output = ws.run(&[], &[&unit]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_no_checkers_means_no_findings() {
    let ws = Workspace::new();
    let unit = ws.unit("bad.json", "long int");
    let output = ws.run(&[], &[&unit]);
    assert!(output.status.success(), "{}", stderr(&output));
}

#[test]
fn test_broken_document_does_not_stop_the_run() {
    let ws = Workspace::new();
    let broken = ws.write("broken.json", "{ not json");
    let unit = ws.unit("good.json", "int");
    let output = ws.run(&["--dump", "--checker", "format-args"], &[&broken, &unit]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("broken.json"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("// f: complexity 1"), "{stdout}");
}

#[test]
fn test_malformed_manifest_is_fatal() {
    let ws = Workspace::new();
    ws.write("site.json", "[");
    let unit = ws.unit("good.json", "int");
    let output = ws.run(&[], &[&unit]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("loading checkers"));
}
