//! Generic extension task scenarios.

use extbuild_lib::artifact::KnownFiles;
use extbuild_lib::engine::{Graph, GraphError, NodeKind};
use extbuild_lib::settings::SettingKey;
use extbuild_lib::{DefaultSettings, ExtensionTask, TaskError, TaskSpec};

use crate::common::{Recorder, gcc_env, strings};

#[test]
fn mylib_with_default_configuration() {
  let mut graph = Graph::new();
  let files = KnownFiles::new(["mylib.c"]);
  let mut task = ExtensionTask::with_env("mylib", gcc_env(), |_| {}).unwrap();
  task.emit_with(&mut graph, &files).unwrap();

  let steps = graph.plan(&strings(&["mylib"]), &files).unwrap();
  let names: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
  assert_eq!(names, vec!["mylib.o", "mylib.so", "mylib"]);

  assert_eq!(steps[0].prerequisites, vec!["mylib.c"]);
  assert_eq!(steps[0].command.as_deref(), Some("gcc -fPIC -c -o mylib.o mylib.c"));

  assert_eq!(steps[1].prerequisites, vec!["mylib.o"]);
  assert_eq!(steps[1].command.as_deref(), Some("cc -shared -o mylib.so mylib.o"));

  assert_eq!(steps[2].kind, NodeKind::Task);
  assert_eq!(steps[2].prerequisites, vec!["mylib.so"]);
}

#[test]
fn paths_are_stable_across_emission() {
  let mut graph = Graph::new();
  let files = KnownFiles::new(["mylib.c"]);
  let mut task = ExtensionTask::with_env("mylib", gcc_env(), |_| {}).unwrap();

  let before = (task.output_objects().unwrap(), task.output_lib());
  task.emit_with(&mut graph, &files).unwrap();
  task.emit_with(&mut graph, &files).unwrap();
  let after = (task.output_objects().unwrap(), task.output_lib());

  assert_eq!(before, after);
  assert_eq!(graph.nodes().len(), 3);
}

#[test]
fn named_target_with_explicit_objects() {
  let mut graph = Graph::new();
  let files = KnownFiles::new(["foo.cc", "config.h"]);
  let spec = TaskSpec::new("sample").with_objects([extbuild_lib::ArtifactRef::stem("foo")]);
  let mut task = ExtensionTask::with_env(spec, gcc_env(), |t| {
    t.deps.push("config.h".to_string());
    t.link_libs.push("bar".to_string());
  })
  .unwrap();
  task.emit_with(&mut graph, &files).unwrap();

  let steps = graph.plan(&[], &files).unwrap();
  let commands: Vec<&str> = steps.iter().filter_map(|s| s.command.as_deref()).collect();
  assert_eq!(
    commands,
    vec!["c++ -fPIC -o foo.o -c foo.cc", "cc -shared -o sample.so foo.o -lbar"]
  );
  assert_eq!(graph.node("sample").unwrap().prerequisites, vec!["config.h", "sample.so"]);
}

#[test]
fn overrides_stay_inside_their_task() {
  let mut graph = Graph::new();
  let files = KnownFiles::new(["fast.c", "slow.c"]);

  let mut fast = ExtensionTask::with_env("fast", gcc_env(), |t| {
    t.env.set(SettingKey::Cflags, "-O3");
    t.env.append(SettingKey::Defines, ["FAST"]).unwrap();
  })
  .unwrap();
  let mut slow = ExtensionTask::with_env("slow", gcc_env(), |_| {}).unwrap();
  fast.emit_with(&mut graph, &files).unwrap();
  slow.emit_with(&mut graph, &files).unwrap();

  let steps = graph.plan(&[], &files).unwrap();
  let command = |name: &str| {
    steps
      .iter()
      .find(|s| s.name == name)
      .and_then(|s| s.command.clone())
      .unwrap()
  };
  assert_eq!(command("fast.o"), "gcc -O3 -DFAST -c -o fast.o fast.c");
  assert_eq!(command("slow.o"), "gcc -fPIC -c -o slow.o slow.c");
}

#[test]
fn process_defaults_are_never_mutated() {
  let before = DefaultSettings::get().clone();
  let task = ExtensionTask::new("mylib", |t| {
    t.env.set(SettingKey::Objext, "obj");
    t.env.append(SettingKey::Includedirs, ["/opt/include"]).unwrap();
  })
  .unwrap();

  assert_eq!(DefaultSettings::get(), &before);
  assert_eq!(task.env.get_str(&SettingKey::Objext).unwrap(), "obj");
}

#[test]
fn missing_source_aborts_emission() {
  let mut graph = Graph::new();
  let mut task = ExtensionTask::with_env("nosrc", gcc_env(), |_| {}).unwrap();

  let err = task.emit_with(&mut graph, &KnownFiles::default()).unwrap_err();

  assert_eq!(
    err,
    TaskError::NoMatchingRule {
      artifact: "nosrc.o".to_string()
    }
  );
  assert!(graph.nodes().is_empty());
  assert!(matches!(
    graph.plan(&strings(&["nosrc"]), &KnownFiles::default()),
    Err(GraphError::UnknownTarget(_))
  ));
}

#[test]
fn run_fires_compile_then_link() {
  let mut graph = Graph::new();
  let files = KnownFiles::new(["a.c", "b.cpp"]);
  let spec = TaskSpec::new("ab").with_objects(["a", "b"].map(extbuild_lib::ArtifactRef::stem));
  let mut task = ExtensionTask::with_env(spec, gcc_env(), |_| {}).unwrap();
  task.emit_with(&mut graph, &files).unwrap();

  let recorder = Recorder::default();
  graph.run(&[], &recorder, &files).unwrap();

  let commands = recorder.commands();
  assert_eq!(commands.len(), 3);
  assert_eq!(commands[2], "cc -shared -o ab.so a.o b.o");
  assert!(commands[..2].contains(&"gcc -fPIC -c -o a.o a.c".to_string()));
  assert!(commands[..2].contains(&"c++ -fPIC -o b.o -c b.cpp".to_string()));
}

#[cfg(unix)]
mod on_disk {
  use extbuild_lib::artifact::FsProbe;
  use extbuild_lib::engine::{Graph, GraphError};
  use extbuild_lib::execute::{ExecuteError, ShellRunner};
  use extbuild_lib::settings::SettingKey;
  use extbuild_lib::ExtensionTask;

  use crate::common::gcc_env;

  fn scripted_env(cc: &str) -> extbuild_lib::Environment {
    let mut env = gcc_env();
    env.set(SettingKey::Cc, cc);
    env.set(SettingKey::Cflags, "");
    env.set(SettingKey::Ldshared, r#"sh -c 'cat "$3" > "$2"' ld"#);
    env
  }

  #[test]
  fn builds_real_files() {
    let dir = tempfile::tempdir().unwrap();
    let dir_str = dir.path().to_string_lossy().to_string();
    std::fs::write(dir.path().join("mylib.c"), "int x;\n").unwrap();

    let mut graph = Graph::new();
    let mut task = ExtensionTask::with_env("mylib", scripted_env(r#"sh -c 'cat "$4" > "$3"' cc"#), |t| {
      t.dir = dir_str.clone();
    })
    .unwrap();
    task.emit(&mut graph).unwrap();

    let results = graph.run(&[], &ShellRunner::new().unwrap(), &FsProbe).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(std::fs::read_to_string(dir.path().join("mylib.so")).unwrap(), "int x;\n");
  }

  #[test]
  fn failed_compile_leaves_no_object() {
    let dir = tempfile::tempdir().unwrap();
    let dir_str = dir.path().to_string_lossy().to_string();
    std::fs::write(dir.path().join("mylib.c"), "int x;\n").unwrap();

    let mut graph = Graph::new();
    let mut task = ExtensionTask::with_env("mylib", scripted_env(r#"sh -c 'echo partial > "$3"; exit 1' cc"#), |t| {
      t.dir = dir_str.clone();
    })
    .unwrap();
    task.emit(&mut graph).unwrap();

    let err = graph.run(&[], &ShellRunner::new().unwrap(), &FsProbe).unwrap_err();

    assert!(matches!(
      err,
      GraphError::Execute {
        source: ExecuteError::ExternalCommandFailed { code: Some(1), .. },
        ..
      }
    ));
    assert!(!dir.path().join("mylib.o").exists());
    assert!(!dir.path().join("mylib.so").exists());
  }
}
