use crate::app::Workspace;
use anyhow::Result;
use std::path::Path;
use studybox_core::graph;
use studybox_core::state::StateRepository;

pub async fn run(home: Option<&Path>) -> Result<()> {
    let workspace = Workspace::open(home)?;
    let Some(bundle) = workspace.state.load_bundle().await? else {
        println!("No study material yet. Run `studybox generate` first.");
        return Ok(());
    };

    let graph = graph::build(&bundle.mind_map_edges, &workspace.config.layout);
    println!("{} ({} nodes, {} edges)", bundle.title, graph.nodes.len(), graph.edges.len());
    for node in &graph.nodes {
        let indent = "  ".repeat(node.rank);
        let root = if node.is_root { " (root)" } else { "" };
        println!(
            "{indent}{}{root}  @ ({:.0}, {:.0})",
            node.label, node.position.x, node.position.y
        );
    }
    Ok(())
}
