use formwork_core::{IdCategory, IdGenerator, NodeId};

use crate::{DependencyGraph, EdgeKind, EdgeMeta};

fn ids(count: usize) -> Vec<NodeId> {
    let mut generator = IdGenerator::new();
    (0..count)
        .map(|_| generator.next(IdCategory::CompileAst))
        .collect()
}

#[test]
fn edges_register_their_endpoints() {
    let [a, b] = ids(2).try_into().unwrap();
    let mut graph = DependencyGraph::new();

    graph.add_edge(a.clone(), b.clone(), EdgeKind::DataFlow, EdgeMeta::property("input"));

    assert!(graph.has_node(&a));
    assert!(graph.has_node(&b));
    assert_eq!(graph.get_dependents(&a), vec![&b]);
    assert_eq!(graph.get_dependencies(&b), vec![&a]);
}

#[test]
fn identical_edges_are_stored_once() {
    let [a, b] = ids(2).try_into().unwrap();
    let mut graph = DependencyGraph::new();

    assert!(graph.add_edge(a.clone(), b.clone(), EdgeKind::DataFlow, EdgeMeta::property("input")));
    assert!(!graph.add_edge(a.clone(), b.clone(), EdgeKind::DataFlow, EdgeMeta::property("input")));
    assert!(graph.add_edge(a.clone(), b.clone(), EdgeKind::DataFlow, EdgeMeta::indexed("steps", 0)));

    assert_eq!(graph.edge_count(), 2);
    assert_eq!(graph.edges_between(&a, &b).len(), 2);
}

#[test]
fn topological_sort_orders_sources_before_targets() {
    let [a, b, c, d] = ids(4).try_into().unwrap();
    let mut graph = DependencyGraph::new();
    graph.add_node(d.clone());
    graph.add_edge(a.clone(), b.clone(), EdgeKind::DataFlow, EdgeMeta::property("x"));
    graph.add_edge(b.clone(), c.clone(), EdgeKind::DataFlow, EdgeMeta::property("y"));
    graph.add_edge(a.clone(), c.clone(), EdgeKind::DataFlow, EdgeMeta::property("z"));

    let result = graph.topological_sort();

    assert!(!result.has_cycles);
    assert_eq!(result.sort.len(), 4);
    let position = |id: &NodeId| result.sort.iter().position(|s| s == id).unwrap();
    assert!(position(&a) < position(&b));
    assert!(position(&b) < position(&c));
}

#[test]
fn ready_nodes_sort_in_insertion_order() {
    let [a, b, c] = ids(3).try_into().unwrap();
    let mut graph = DependencyGraph::new();
    // Insert in reverse so insertion order, not id order, is observable.
    graph.add_node(c.clone());
    graph.add_node(b.clone());
    graph.add_node(a.clone());

    let result = graph.topological_sort();

    assert_eq!(result.sort, vec![c, b, a]);
}

#[test]
fn cycles_are_reported_with_witnesses() {
    let [a, b, c] = ids(3).try_into().unwrap();
    let mut graph = DependencyGraph::new();
    graph.add_edge(a.clone(), b.clone(), EdgeKind::DataFlow, EdgeMeta::property("x"));
    graph.add_edge(b.clone(), a.clone(), EdgeKind::DataFlow, EdgeMeta::property("y"));
    graph.add_edge(a.clone(), c.clone(), EdgeKind::DataFlow, EdgeMeta::property("z"));

    let result = graph.topological_sort();

    assert!(result.has_cycles);
    assert!(result.cycles.contains(&a));
    assert!(result.cycles.contains(&b));
    // c depends on the cycle, so it is unsortable too.
    assert!(result.cycles.contains(&c));
    assert!(result.sort.is_empty());
}

#[test]
fn dump_renders_insertion_order() {
    let [a, b] = ids(2).try_into().unwrap();
    let mut graph = DependencyGraph::new();
    graph.add_edge(a, b, EdgeKind::DataFlow, EdgeMeta::indexed("arguments", 1));

    insta::assert_snapshot!(graph.dump(), @r"
    nodes:
      compile_ast:1
      compile_ast:2
    edges:
      compile_ast:1 -> compile_ast:2 [arguments[1]]
    ");
}
