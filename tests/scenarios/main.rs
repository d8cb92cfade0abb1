//! End-to-end scenarios: graph file in, algorithm run, observable
//! states and log out.

use euclid::default::Point2D;
use graphtrace::runtime::RunState;
use graphtrace::script::vars::ScriptVars;
use graphtrace::{
    ElementState, ExecutionController, Graph, RunError, Script, ScriptError, VertexId, algo,
    persistence,
};

fn chain(n: usize) -> Graph {
    let mut graph = Graph::new();
    let ids: Vec<_> = (0..n)
        .map(|i| {
            graph
                .add_vertex(format!("v{}", i + 1), Point2D::new(i as f32, 0.0))
                .unwrap()
        })
        .collect();
    for pair in ids.windows(2) {
        graph.add_edge(pair[0], pair[1], 1.0).unwrap();
    }
    graph
}

#[test]
fn bfs_finds_and_activates_the_path() {
    let mut controller = ExecutionController::new(chain(3));
    controller.run(Box::new(algo::Bfs::default())).unwrap();
    let report = controller.wait().unwrap();

    assert_eq!(report.outcome, RunState::Completed);
    assert!(report.solved);

    controller.host().with_graph(|g| {
        for v in [1u64, 2, 3] {
            assert_eq!(g.vertex(VertexId(v)).unwrap().state(), ElementState::Active);
        }
        assert!(g.edges().all(|e| e.state() == ElementState::Active));
    });
    let visible = controller.host().with_log(|log| {
        log.visible("$").iter().map(|s| s.to_string()).collect::<Vec<_>>()
    });
    assert!(visible.iter().any(|line| line == "path [ 1 2 3 ]"));
}

#[test]
fn bfs_reports_no_path_on_disconnected_graph() {
    let mut graph = chain(2);
    // Destination vertex with no edges at all.
    graph.add_vertex("island", Point2D::new(9.0, 9.0)).unwrap();

    let mut controller = ExecutionController::new(graph);
    controller.run(Box::new(algo::Bfs::default())).unwrap();
    let report = controller.wait().unwrap();

    assert_eq!(report.outcome, RunState::Completed);
    assert!(!report.solved);
    controller.host().with_graph(|g| {
        assert!(g.edges().all(|e| e.state() != ElementState::Active));
        for v in g.vertices() {
            assert_eq!(v.active_edge_count(), 0);
        }
    });
}

#[test]
fn dfs_and_first_path_agree_on_a_chain() {
    for script in [
        Box::new(algo::Dfs::default()) as Box<dyn Script>,
        Box::new(algo::FirstPath::default()),
    ] {
        let mut controller = ExecutionController::new(chain(4));
        controller.run(script).unwrap();
        let report = controller.wait().unwrap();
        assert_eq!(report.outcome, RunState::Completed);
        assert!(report.solved, "{} did not solve the chain", report.script);
        controller.host().with_graph(|g| {
            assert_eq!(
                g.vertices()
                    .filter(|v| v.state() == ElementState::Active)
                    .count(),
                4
            );
        });
    }
}

#[test]
fn script_vars_choose_the_endpoints() {
    let mut controller = ExecutionController::new(chain(5));
    controller.host().set_vars(ScriptVars::from_map(
        serde_json::from_str(r#"{"begin": 2, "end": 4}"#).unwrap(),
    ));
    controller.run(Box::new(algo::Bfs::default())).unwrap();
    let report = controller.wait().unwrap();

    assert!(report.solved);
    controller.host().with_graph(|g| {
        // Endpoints and the middle of the 2-3-4 stretch are the answer.
        for v in [2u64, 3, 4] {
            assert_eq!(g.vertex(VertexId(v)).unwrap().state(), ElementState::Active);
        }
        // Vertex 1 may have been explored but is not on the path;
        // vertex 5 is beyond the destination and never touched.
        assert_ne!(g.vertex(VertexId(1)).unwrap().state(), ElementState::Active);
        assert_eq!(g.vertex(VertexId(5)).unwrap().state(), ElementState::None);
    });
}

#[test]
fn vertex_info_highlights_the_neighborhood() {
    let mut controller = ExecutionController::new(chain(3));
    controller.host().set_vars(ScriptVars::from_map(
        serde_json::from_str(r#"{"id": 2}"#).unwrap(),
    ));
    controller.run(Box::new(algo::VertexInfo::default())).unwrap();
    let report = controller.wait().unwrap();

    assert_eq!(report.outcome, RunState::Completed);
    controller.host().with_graph(|g| {
        assert_eq!(g.vertex(VertexId(2)).unwrap().state(), ElementState::Active);
        assert_eq!(g.vertex(VertexId(1)).unwrap().state(), ElementState::Testing);
        assert_eq!(g.vertex(VertexId(3)).unwrap().state(), ElementState::Testing);
    });
    let visible = controller
        .host()
        .with_log(|log| log.visible("$").join("\n"));
    assert!(visible.contains("vertex 2"));
    assert!(visible.contains("edges: 2"));
}

#[test]
fn model_is_frozen_during_a_run_and_thawed_after() {
    let (gate_tx, gate_rx) = crossbeam_channel::bounded::<()>(0);
    let (entered_tx, entered_rx) = crossbeam_channel::bounded::<()>(0);

    struct Holder {
        entered: crossbeam_channel::Sender<()>,
        gate: crossbeam_channel::Receiver<()>,
    }
    impl Script for Holder {
        fn name(&self) -> &str {
            "holder"
        }
        fn run(&mut self, _app: &graphtrace::HostProxy) -> Result<(), ScriptError> {
            let _ = self.entered.send(());
            let _ = self.gate.recv();
            Ok(())
        }
    }

    let mut controller = ExecutionController::new(chain(2));
    controller
        .run(Box::new(Holder {
            entered: entered_tx,
            gate: gate_rx,
        }))
        .unwrap();
    entered_rx.recv().unwrap();

    // Mid-run: structure frozen, second run rejected.
    controller.host().with_graph_mut(|g| {
        assert!(!g.is_editable());
        assert!(g.add_vertex("late", Point2D::new(5.0, 5.0)).is_err());
    });
    assert_eq!(
        controller
            .run(Box::new(algo::Bfs::default()))
            .unwrap_err(),
        RunError::AlreadyRunning
    );

    gate_tx.send(()).unwrap();
    let report = controller.wait().unwrap();
    assert_eq!(report.outcome, RunState::Completed);
    controller.host().with_graph_mut(|g| {
        assert!(g.is_editable());
        assert!(g.add_vertex("late", Point2D::new(5.0, 5.0)).is_ok());
    });
}

#[test]
fn graph_file_survives_a_run_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chain.json");
    persistence::save(&chain(3), &path).unwrap();

    let mut loaded = Graph::new();
    persistence::load_into(&mut loaded, &path).unwrap();
    assert_eq!(loaded.vertex_count(), 3);
    assert_eq!(loaded.edge_count(), 2);

    let mut controller = ExecutionController::new(loaded);
    controller.run(Box::new(algo::Bfs::default())).unwrap();
    assert!(controller.wait().unwrap().solved);

    // Saving after the run keeps structure; run state is not persisted.
    let saved_again = dir.path().join("chain2.json");
    controller
        .host()
        .with_graph(|g| persistence::save(g, &saved_again))
        .unwrap();
    let mut reloaded = Graph::new();
    persistence::load_into(&mut reloaded, &saved_again).unwrap();
    assert!(reloaded.vertices().all(|v| v.state() == ElementState::None));
    assert_eq!(reloaded.edge_count(), 2);
}

#[test]
fn loading_a_file_twice_merges_with_fresh_ids() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chain.json");
    persistence::save(&chain(2), &path).unwrap();

    let mut graph = Graph::new();
    persistence::load_into(&mut graph, &path).unwrap();
    persistence::load_into(&mut graph, &path).unwrap();

    assert_eq!(graph.vertex_count(), 4);
    assert_eq!(graph.edge_count(), 2);
    let ids: std::collections::HashSet<_> = graph.vertices().map(|v| v.id).collect();
    assert_eq!(ids.len(), 4);
}
