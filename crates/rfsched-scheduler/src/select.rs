use k8s_openapi::api::core::v1::Node;
use rand::seq::IndexedRandom;
use rand::Rng;
use rfsched_core::node_has_label;

/// Nodes that carry `label_key` and have a name to bind to
pub fn matching_nodes<'a>(nodes: &'a [Node], label_key: &str) -> Vec<&'a Node> {
    nodes
        .iter()
        .filter(|node| node.metadata.name.as_deref().is_some_and(|n| !n.is_empty()))
        .filter(|node| node_has_label(node, label_key))
        .collect()
}

/// Pick one node carrying `label_key`, uniformly at random.
///
/// Returns `None` when no node carries the label, which is the normal state
/// until an operator labels a target node.
pub fn select_node<'a, R: Rng + ?Sized>(
    nodes: &'a [Node],
    label_key: &str,
    rng: &mut R,
) -> Option<&'a Node> {
    matching_nodes(nodes, label_key).choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{BTreeMap, HashMap};

    const KEY: &str = "rf.scheduler.foo.default/pod1";

    fn create_test_node(name: &str, labels: &[&str]) -> Node {
        let mut node = Node::default();
        node.metadata.name = Some(name.to_string());
        node.metadata.labels = Some(
            labels
                .iter()
                .map(|l| (l.to_string(), String::new()))
                .collect::<BTreeMap<_, _>>(),
        );
        node
    }

    fn node_name(node: &Node) -> &str {
        node.metadata.name.as_deref().unwrap()
    }

    #[test]
    fn test_no_nodes() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(select_node(&[], KEY, &mut rng).is_none());
    }

    #[test]
    fn test_unlabeled_node() {
        let mut rng = StdRng::seed_from_u64(1);
        let nodes = vec![create_test_node("node1", &[])];
        assert!(select_node(&nodes, KEY, &mut rng).is_none());

        let mut bare = Node::default();
        bare.metadata.name = Some("node2".to_string());
        assert!(select_node(&[bare], KEY, &mut rng).is_none());
    }

    #[test]
    fn test_single_matching_node() {
        let mut rng = StdRng::seed_from_u64(1);
        let nodes = vec![
            create_test_node("node1", &["rf.scheduler.foo.default/pod2"]),
            create_test_node("node2", &[KEY]),
            create_test_node("node3", &[]),
        ];
        for _ in 0..20 {
            let selected = select_node(&nodes, KEY, &mut rng).unwrap();
            assert_eq!(node_name(selected), "node2");
        }
    }

    #[test]
    fn test_near_miss_label_does_not_match() {
        let mut rng = StdRng::seed_from_u64(1);
        for label in [
            "rf.scheduler.foo.default/pod1-invalid",
            "rf.scheduler.foo.default/pod",
            "rf.scheduler.foo.default/Pod1",
            "rf.scheduler.fo.default/pod1",
            "rf.scheduler.foo/pod1",
        ] {
            let nodes = vec![create_test_node("node1", &[label])];
            assert!(
                select_node(&nodes, KEY, &mut rng).is_none(),
                "label '{}' must not match",
                label
            );
        }
    }

    #[test]
    fn test_unnamed_node_is_skipped() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut unnamed = create_test_node("x", &[KEY]);
        unnamed.metadata.name = None;
        assert!(select_node(&[unnamed], KEY, &mut rng).is_none());
    }

    #[test]
    fn test_selection_varies_across_seeds() {
        let nodes = vec![
            create_test_node("node1", &[KEY]),
            create_test_node("node2", &[KEY]),
            create_test_node("node3", &[KEY]),
        ];

        let picked: std::collections::BTreeSet<String> = (0..50)
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                node_name(select_node(&nodes, KEY, &mut rng).unwrap()).to_string()
            })
            .collect();

        assert!(picked.len() > 1, "selection never varied: {:?}", picked);
    }

    #[test]
    fn test_selection_is_roughly_uniform() {
        let nodes = vec![
            create_test_node("node1", &[KEY]),
            create_test_node("node2", &[KEY]),
            create_test_node("node3", &[KEY]),
            create_test_node("other", &[]),
        ];
        let mut rng = StdRng::seed_from_u64(42);

        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..3000 {
            let node = select_node(&nodes, KEY, &mut rng).unwrap();
            *counts.entry(node_name(node).to_string()).or_insert(0) += 1;
        }

        assert_eq!(counts.len(), 3);
        for (name, count) in &counts {
            assert!(
                (800..=1200).contains(count),
                "node {} picked {} times out of 3000",
                name,
                count
            );
        }
    }
}
