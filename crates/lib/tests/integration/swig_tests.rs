//! Generated-source extension task scenarios.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use extbuild_lib::artifact::KnownFiles;
use extbuild_lib::engine::{Graph, GraphError};
use extbuild_lib::execute::ExecuteError;
use extbuild_lib::tool::VersionGate;
use extbuild_lib::{ArtifactRef, SwigExtensionTask};

use crate::common::{Recorder, fake_gate, gcc_env, strings};

#[test]
fn dbxml_generates_compiles_and_links() {
  let (gate, _) = fake_gate("1.3.31");
  let files = KnownFiles::new(["dbxml.i", "dbxml_ruby.i"]);
  let mut graph = Graph::new();

  let mut task = SwigExtensionTask::with_env("dbxml", gcc_env(), gate, |t| {
    t.depend("dbxml", ArtifactRef::stem("dbxml_ruby"));
    t.base.link_libs = strings(&["db", "dbxml"]);
  })
  .unwrap();
  task.emit_with(&mut graph, &files).unwrap();

  let steps = graph.plan(&strings(&["dbxml"]), &files).unwrap();
  let names: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
  assert_eq!(names, vec!["dbxml_wrap.cc", "dbxml_wrap.o", "dbxml.so", "dbxml"]);

  assert_eq!(steps[0].prerequisites, vec!["dbxml.i", "dbxml_ruby.i"]);
  assert_eq!(
    steps[0].command.as_deref(),
    Some("swig -ruby -c++ -I. -o dbxml_wrap.cc dbxml.i")
  );
  assert_eq!(steps[1].prerequisites, vec!["dbxml_wrap.cc"]);
  assert_eq!(
    steps[1].command.as_deref(),
    Some("c++ -fPIC -o dbxml_wrap.o -c dbxml_wrap.cc")
  );
  assert_eq!(steps[2].prerequisites, vec!["dbxml_wrap.o"]);
  assert_eq!(
    steps[2].command.as_deref(),
    Some("cc -shared -o dbxml.so dbxml_wrap.o -ldb -ldbxml")
  );
  assert_eq!(steps[3].prerequisites, vec!["dbxml.so"]);
}

#[test]
fn old_generator_is_rejected_when_generation_runs() {
  let (gate, calls) = fake_gate("1.2");
  let files = KnownFiles::new(["dbxml.i"]);
  let mut graph = Graph::new();

  let mut task = SwigExtensionTask::with_env("dbxml", gcc_env(), gate, |_| {}).unwrap();
  task.emit_with(&mut graph, &files).unwrap();
  assert_eq!(calls.load(Ordering::SeqCst), 0);

  let recorder = Recorder::default();
  let err = graph.run(&[], &recorder, &files).unwrap_err();

  match err {
    GraphError::Execute {
      step,
      source: ExecuteError::UnsupportedToolVersion { required, found, .. },
    } => {
      assert_eq!(step, "dbxml_wrap.cc");
      assert_eq!(required, "1.3");
      assert_eq!(found.as_deref(), Some("1.2"));
    }
    other => panic!("expected UnsupportedToolVersion, got {other:?}"),
  }
  assert!(recorder.commands().is_empty());
}

#[test]
fn generator_is_probed_once_for_many_tasks() {
  let (gate, calls) = fake_gate("1.3.31");
  let names = ["alpha", "beta", "gamma"];
  let files = KnownFiles::new(names.map(|n| format!("{n}.i")));
  let mut graph = Graph::new();

  for name in names {
    let mut task = SwigExtensionTask::with_env(name, gcc_env(), Arc::clone(&gate), |_| {}).unwrap();
    task.emit_with(&mut graph, &files).unwrap();
  }

  let recorder = Recorder::default();
  graph.run(&[], &recorder, &files).unwrap();

  assert_eq!(calls.load(Ordering::SeqCst), 1);
  assert_eq!(recorder.commands().iter().filter(|c| c.starts_with("swig ")).count(), 3);
}

#[test]
fn interface_dependencies_follow_the_interface() {
  let (gate, _) = fake_gate("2.0.4");
  let mut graph = Graph::new();
  let files = KnownFiles::new(["foo.i", "bar.i", "common.i"]);

  let mut task = SwigExtensionTask::with_env("pair", gcc_env(), gate, |t| {
    t.interfaces = vec![ArtifactRef::stem("foo"), ArtifactRef::stem("bar")];
    t.depend("foo", ArtifactRef::stem("common"));
  })
  .unwrap();
  task.emit_with(&mut graph, &files).unwrap();

  assert_eq!(graph.node("foo_wrap.cc").unwrap().prerequisites, vec!["foo.i", "common.i"]);
  assert_eq!(graph.node("bar_wrap.cc").unwrap().prerequisites, vec!["bar.i"]);
  assert_eq!(
    graph.node("pair.so").unwrap().prerequisites,
    vec!["foo_wrap.o", "bar_wrap.o"]
  );
}

#[test]
fn process_wide_gate_is_shared() {
  assert!(Arc::ptr_eq(&VersionGate::swig(), &VersionGate::swig()));

  let a = SwigExtensionTask::new("a", |_| {}).unwrap();
  let b = SwigExtensionTask::new("b", |_| {}).unwrap();
  assert!(Arc::ptr_eq(a.gate(), b.gate()));
}
