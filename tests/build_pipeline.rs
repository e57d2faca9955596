//! End-to-end builds of small projects on temporary directories.

use std::path::Path;

use oortc::emit::DiagnosticKind;
use oortc::project::ProjectConfig;
use oortc::{build, compile, BuildError};

const PROPERTIES: &str = r#"{
    "package": { "name": "demo", "namespace": "demo" },
    "minecraft": { "version": "1.20.4" },
    "entrypoints": { "load": "src/main.oort", "tick": "src/main.oort" }
}"#;

fn project(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("properties.json"), PROPERTIES).unwrap();
    for (name, src) in files {
        let path = dir.path().join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, src).unwrap();
    }
    dir
}

fn config(dir: &Path) -> ProjectConfig {
    ProjectConfig::from_project_dir(dir).unwrap()
}

#[test]
fn macro_call_expands_into_load_function() {
    let dir = project(&[(
        "src/main.oort",
        "macro foo(x) { say(x) }\non load { foo(1) }\non tick { }",
    )]);
    let pack = compile(&config(dir.path())).unwrap();
    assert_eq!(
        pack.datapack.function("demo", "src/main/on_load"),
        Some("scoreboard objectives add oort_vars dummy\nsay 1")
    );
    assert!(pack.diagnostics.is_empty());
}

#[test]
fn if_calls_user_function_or_builtin() {
    let dir = project(&[(
        "src/main.oort",
        "fn heal() { give(@s, \"potion\") }\n\
         on load { }\n\
         on tick {\n  if hp < 10 { heal() }\n  if hp < 10 { kill(@s) }\n}",
    )]);
    let pack = compile(&config(dir.path())).unwrap();
    let dp = &pack.datapack;

    assert_eq!(dp.function("demo", "src/main/if_body_1"), Some("function demo:src/main/heal"));
    assert_eq!(dp.function("demo", "src/main/if_body_2"), Some("kill @s"));
    assert_eq!(
        dp.function("demo", "src/main/on_tick"),
        Some(
            "execute if score hp oort_vars matches ..9 run function demo:src/main/if_body_1\n\
             execute if score hp oort_vars matches ..9 run function demo:src/main/if_body_2"
        )
    );
    assert_eq!(dp.function("demo", "src/main/heal"), Some("give @s potion"));
}

#[test]
fn var_assignment_and_increment() {
    let dir = project(&[(
        "src/main.oort",
        "on load {\n  var x = 5\n  x = x + 3\n}\non tick { }",
    )]);
    let pack = compile(&config(dir.path())).unwrap();
    assert_eq!(
        pack.datapack.function("demo", "src/main/on_load"),
        Some(
            "scoreboard objectives add oort_vars dummy\n\
             scoreboard players set x oort_vars 5\n\
             scoreboard players operation x oort_vars = x oort_vars\n\
             scoreboard players add x oort_vars 3"
        )
    );
}

#[test]
fn build_writes_the_datapack_tree() {
    let dir = project(&[(
        "src/main.oort",
        "on load { say(\"ready\") }\non tick { while t > 0 { t = t - 1 } }",
    )]);
    let report = build(&config(dir.path())).unwrap();
    let root = dir.path().join("build/demo-datapack");
    assert_eq!(report.datapack_root, root.canonicalize().unwrap());
    assert_eq!(report.modules, 1);
    assert_eq!(report.functions, 4);

    let meta: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(root.join("pack.mcmeta")).unwrap()).unwrap();
    assert_eq!(meta["pack"]["pack_format"], 26);

    let load: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(root.join("data/minecraft/tags/functions/load.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(load["values"][0], "demo:src/main/on_load");

    let functions = root.join("data/demo/functions/src/main");
    for name in ["on_load", "on_tick", "while_1_check", "while_1_body"] {
        assert!(functions.join(format!("{name}.mcfunction")).is_file(), "{name}");
    }
    let body = std::fs::read_to_string(functions.join("while_1_body.mcfunction")).unwrap();
    assert!(body.ends_with("schedule function demo:src/main/while_1_check 1t"));
}

#[test]
fn output_override_and_clean() {
    let dir = project(&[("src/main.oort", "on load { }\non tick { }")]);
    let out = tempfile::tempdir().unwrap();
    let stale = out.path().join("demo-datapack/stale.mcfunction");
    std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
    std::fs::write(&stale, "old").unwrap();

    let config = config(dir.path()).with_output(out.path());
    let report = build(&config).unwrap();
    assert!(report.datapack_root.starts_with(out.path()));
    assert!(!stale.exists());
    assert!(!dir.path().join("build").exists());
}

#[test]
fn diagnostics_do_not_fail_the_build() {
    let dir = project(&[(
        "src/main.oort",
        "on load { missing() }\non tick { if a < 1 { } else { say(1) } }",
    )]);
    let pack = compile(&config(dir.path())).unwrap();
    let kinds: Vec<_> = pack.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![DiagnosticKind::Unresolved, DiagnosticKind::Unimplemented]);
    assert_eq!(
        pack.datapack.function("demo", "src/main/on_load"),
        Some("scoreboard objectives add oort_vars dummy\n# ERROR: Unresolved function call to 'missing'")
    );
}

#[test]
fn expanded_modules_are_re_resolved() {
    // The macro introduces a call to a function declared next to it; the
    // second symbol pass must see the spliced call in the load block.
    let dir = project(&[(
        "src/main.oort",
        "fn reset() { score = 0 }\nmacro boot() { reset() }\non load { boot() }\non tick { }",
    )]);
    let pack = compile(&config(dir.path())).unwrap();
    assert_eq!(
        pack.datapack.function("demo", "src/main/on_load"),
        Some("scoreboard objectives add oort_vars dummy\nfunction demo:src/main/reset")
    );
    let main = &pack.modules[0];
    assert!(main.scope.is_some());
    assert_eq!(main.statements.len(), 3, "macro declaration dropped");
}

#[test]
fn stage_errors_are_reported_by_kind() {
    let dir = project(&[("src/main.oort", "on load { say(1) $ }\non tick { }")]);
    let err = compile(&config(dir.path())).unwrap_err();
    assert!(matches!(err, BuildError::Compile(_)));
    assert!(err.to_string().contains("lex error"));

    let dir = project(&[("src/main.oort", "fn a() { }\nfn a() { }\non load { }\non tick { }")]);
    let err = compile(&config(dir.path())).unwrap_err();
    assert!(err.to_string().starts_with("symbol error:"));

    let dir = project(&[(
        "src/main.oort",
        "macro two(a, b) { say(a) }\non load { two(1) }\non tick { }",
    )]);
    let err = compile(&config(dir.path())).unwrap_err();
    assert!(matches!(err, BuildError::Macro(_)));
    assert!(err.to_string().contains("expects 2 argument(s), got 1"));
}
