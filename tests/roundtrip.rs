//! Integration tests for reading GeoStudio documents and writing them back.

use std::rc::Rc;

use geostudio::analysis::ANALYSES_TAG;
use geostudio::prelude::*;
use geostudio::xml::{self, WriteOptions};

use tempfile::tempdir;

const DOCUMENT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<GSIData Version="11.4">
  <Analyses Len="2">
    <Analysis>
      <ID>1</ID>
      <Name>Initial Conditions</Name>
      <Kind>SEEP/W</Kind>
      <Description>Steady state</Description>
      <Method>SteadyState</Method>
      <GeometryId>1</GeometryId>
      <ComputedPhysics>
        <Hydraulic>true</Hydraulic>
      </ComputedPhysics>
    </Analysis>
    <Analysis>
      <ID>2</ID>
      <Name>Drawdown</Name>
      <Kind>SEEP/W</Kind>
      <ParentID>1</ParentID>
      <Method>Transient</Method>
      <GeometryId>1</GeometryId>
      <ExcludeInitDeformation>false</ExcludeInitDeformation>
      <Results Folder="Drawdown">
        <Step Time="2" />
      </Results>
      <TimeIncrements>
        <Start>0</Start>
        <Duration>10</Duration>
        <IncrementOption>Exponential</IncrementOption>
        <IncrementCount>2</IncrementCount>
        <TimeSteps Len="2">
          <TimeStep Step="2" ElapsedTime="2" Save="true" />
          <TimeStep Step="8" ElapsedTime="10" Save="true" />
        </TimeSteps>
      </TimeIncrements>
      <PhysicsOptions Heat="false" />
      <ConvergenceCriteria>
        <MaxIterations>50</MaxIterations>
      </ConvergenceCriteria>
    </Analysis>
  </Analyses>
</GSIData>
"#;

#[test]
fn test_roundtrip_document() {
    let original = xml::parse_str(DOCUMENT).expect("Failed to parse document");
    let analyses = read_analyses(&original).expect("Failed to read analyses");
    assert_eq!(analyses.len(), 2);

    let mut rewritten = original.clone();
    write_analyses(&mut rewritten, &analyses).expect("Failed to write analyses");
    let text = xml::to_string(&rewritten, &WriteOptions::default()).expect("Failed to serialize");

    let reparsed = xml::parse_str(&text).expect("Failed to reparse");
    assert_eq!(reparsed, original, "canonical document should survive unchanged");

    let again = read_analyses(&reparsed).unwrap();
    for (a, b) in analyses.iter().zip(&again) {
        assert_eq!(a.store(), b.store());
        assert_eq!(a.time_increments(), b.time_increments());
        assert_eq!(a.results(), b.results());
        assert_eq!(a.geometry_id().unwrap(), b.geometry_id().unwrap());
    }
}

#[test]
fn test_typed_access() {
    let root = xml::parse_str(DOCUMENT).unwrap();
    let analyses = read_analyses(&root).unwrap();
    let drawdown = find_analysis(&analyses, 2).unwrap();

    assert_eq!(drawdown.to_string(), "Analysis(ID: 2, Name: \"Drawdown\")");
    assert_eq!(drawdown.kind().unwrap(), AnalysisKind::Seep);
    assert_eq!(drawdown.parent_id().unwrap(), Some(1));
    assert_eq!(drawdown.exclude_init_deformation().unwrap(), Some(false));
    assert_eq!(drawdown.physics_options().unwrap(), vec![("Heat", "false")]);
    assert_eq!(drawdown.results().unwrap().attributes().get("Folder"), Some("Drawdown"));
    assert!(drawdown.store().extra("ConvergenceCriteria").is_some());

    let ti = drawdown.time_increments().unwrap();
    assert_eq!(ti.duration().unwrap(), Some(10.0));
    assert_eq!(ti.increment_option().unwrap(), Some(IncrementOption::Exponential));
    assert_eq!(ti.saved_times().unwrap(), vec![2.0, 10.0]);
    assert_eq!(ti.count_mismatch().unwrap(), None);

    let tree = AnalysisTree::build(&analyses).unwrap();
    assert_eq!(
        tree.render(),
        "[1] Initial Conditions (SEEP/W)\n  [2] Drawdown (SEEP/W)\n"
    );
}

#[test]
fn test_rebuilt_schedule_survives_file_roundtrip() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("project.xml");

    let mut root = xml::parse_str(DOCUMENT).unwrap();
    let mut analyses = read_analyses(&root).unwrap();
    analyses[1]
        .time_increments_mut()
        .set_time_steps(&[5.0, 2.0, 10.0], &[false, true, true])
        .unwrap();
    write_analyses(&mut root, &analyses).unwrap();
    xml::write_file(&path, &root, &WriteOptions::compact()).expect("Failed to write file");

    let root = xml::read_file(&path).expect("Failed to read file");
    let analyses = read_analyses(&root).unwrap();
    let ti = analyses[1].time_increments().unwrap();
    assert_eq!(ti.all_times().unwrap(), vec![2.0, 5.0, 10.0]);
    assert_eq!(ti.saved_times().unwrap(), vec![2.0, 10.0]);
    assert_eq!(ti.increment_count().unwrap(), Some(3));

    let steps = root
        .child(ANALYSES_TAG)
        .and_then(|l| l.children_named("Analysis").nth(1))
        .and_then(|a| a.child("TimeIncrements"))
        .and_then(|t| t.child("TimeSteps"))
        .unwrap();
    assert_eq!(steps.attr("Len"), Some("3"));
    let second = steps.children().nth(1).unwrap();
    assert_eq!(second.attr("Step"), Some("3"));
    assert_eq!(second.attr("Save"), None);
}

struct Mesh;

impl GeometrySource for Mesh {
    fn id(&self) -> i64 {
        4
    }

    fn point(&self, id: usize) -> Option<[f64; 2]> {
        [[0.0, 0.0], [10.0, 0.0], [10.0, 5.0]].get(id.checked_sub(1)?).copied()
    }

    fn region(&self, index: usize) -> Option<Vec<usize>> {
        (index == 1).then(|| vec![1, 2, 3])
    }
}

struct SingleMaterial;

impl ContextSource for SingleMaterial {
    fn region_materials(&self) -> Option<Vec<(usize, i64)>> {
        Some(vec![(1, 2)])
    }
}

#[test]
fn test_live_geometry_replaces_document_id() {
    let root = xml::parse_str(DOCUMENT).unwrap();
    let mut analyses = read_analyses(&root).unwrap();
    let mesh = Rc::new(Mesh);
    let context = Rc::new(SingleMaterial);
    analyses[0].set_geometry(&mesh);
    analyses[0].set_context(&context);

    let view = analyses[0].render_problem().unwrap();
    assert_eq!(view.geometry_id, 4);
    assert_eq!(view.regions[0].material, 2);
    assert_eq!(view.regions[0].polygon.len(), 3);

    let node = analyses[0].to_element().unwrap();
    let ids: Vec<&str> = node.children_named("GeometryId").map(|c| c.text()).collect();
    assert_eq!(ids, vec!["4"]);
    assert!(node.child("Geometry").is_none());
    assert!(node.child("Context").is_none());
}
