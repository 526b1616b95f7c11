mod common;

use pretty_assertions::assert_eq;
use sable_compiler::compile::deps::{DependencyError, FunctionDependencies, FunctionDependencyGraph};

fn function<'a>(name: &'a str, dependencies: &[&'a str]) -> FunctionDependencies<'a> {
    let mut function = FunctionDependencies::new(name);
    for dependency in dependencies {
        function.push(*dependency).unwrap();
    }
    function
}

fn chain() -> Vec<FunctionDependencies<'static>> {
    vec![function("a", &[]), function("b", &["a"]), function("c", &["b"])]
}

#[test]
fn test_chain_layers_in_any_order() {
    common::init_logging();

    let orders: [[usize; 3]; 6] = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
    for order in orders {
        let functions = chain();
        let mut graph = FunctionDependencyGraph::new();
        for index in order {
            graph.push(functions[index].clone()).unwrap();
        }

        let a = graph.layer_of("a").unwrap();
        let b = graph.layer_of("b").unwrap();
        let c = graph.layer_of("c").unwrap();
        assert!(a < b && b < c, "order {:?} gave layers {} {} {}", order, a, b, c);

        let names: Vec<&str> = graph.iter().map(|entry| entry.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}

#[test]
fn test_independent_functions_share_a_layer() {
    let mut graph = FunctionDependencyGraph::new();
    graph.push(function("main", &["left", "right"])).unwrap();
    graph.push(function("left", &[])).unwrap();
    graph.push(function("right", &[])).unwrap();

    let layers: Vec<Vec<&str>> = graph
        .layers()
        .iter()
        .map(|layer| layer.iter().map(|entry| entry.name()).collect())
        .collect();
    assert_eq!(layers, vec![vec!["left", "right"], vec!["main"]]);
}

#[test]
fn test_self_dependency_rejected() {
    let mut f = FunctionDependencies::new("f");
    assert_eq!(f.push("f"), Err(DependencyError::SelfDependency("f".to_string())));
    assert!(f.dependencies().is_empty());
}

#[test]
fn test_cycle_rejected() {
    let mut graph = FunctionDependencyGraph::new();
    graph.push(function("a", &["b"])).unwrap();
    graph.push(function("b", &["c"])).unwrap();

    assert_eq!(
        graph.push(function("c", &["a"])),
        Err(DependencyError::Cyclic("c".to_string()))
    );
    assert!(!graph.contains("c"));
    assert_eq!(graph.len(), 2);
}

#[test]
fn test_duplicate_rejected() {
    let mut graph = FunctionDependencyGraph::new();
    graph.push(function("a", &[])).unwrap();
    assert_eq!(
        graph.push(function("a", &[])),
        Err(DependencyError::AlreadyPlaced("a".to_string()))
    );
}
