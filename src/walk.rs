//! Stage 6: Narrative Walker — depth-first traversal producing numbered lines.
//!
//! One call per start event, each with its own fresh cross-reference/loop-detection
//! state: two start events in the same process never share a numbering path.

use std::collections::{HashMap, HashSet};

use crate::collect::ProcessGraph;
use crate::lanes::UNKNOWN_ACTOR;
use crate::model::{Artifact, ArtifactKind, Node, NodeId, NodeKind};

fn format_number(parts: &[usize]) -> String {
    parts.iter().map(ToString::to_string).collect::<Vec<_>>().join(".")
}

fn compare_parts(a: &[usize], b: &[usize]) -> std::cmp::Ordering {
    for (xa, xb) in a.iter().zip(b.iter()) {
        match xa.cmp(xb) {
            std::cmp::Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

fn clean_note(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn describe_node(node: &Node) -> String {
    let display = node.display_name();

    match &node.kind {
        NodeKind::Task(_) => format!("Atividade: {display}"),
        NodeKind::Gateway(kind) => {
            if node.name.as_deref().unwrap_or("").is_empty() {
                kind.label().to_string()
            } else {
                format!("{}: {display}", kind.label())
            }
        }
        NodeKind::Event(ed) => {
            let base = ed.position.map(|p| p.label()).unwrap_or("Evento");
            let catch_throw = ed.catch_throw;
            let type_label = if ed.flavor == "link" && catch_throw.is_some() {
                format!("{base} (link, {})", catch_throw.unwrap())
            } else {
                let mut parts = Vec::new();
                if !ed.flavor.is_empty() {
                    parts.push(ed.flavor.clone());
                }
                if let Some(ct) = catch_throw {
                    parts.push(ct.to_string());
                }
                if parts.is_empty() {
                    base.to_string()
                } else {
                    format!("{base} ({})", parts.join(", "))
                }
            };
            format!("{type_label}: {display}")
        }
        NodeKind::Subprocess(kind) => {
            format!("{}: {display}", node_category_label_for_subprocess(*kind))
        }
    }
}

fn node_category_label_for_subprocess(kind: crate::model::SubprocessKind) -> &'static str {
    match kind {
        crate::model::SubprocessKind::Inline => "Subprocesso",
        crate::model::SubprocessKind::CallActivity => "Subprocesso (call activity)",
    }
}

#[derive(Default)]
struct WalkState {
    number_map: HashMap<NodeId, (String, Vec<usize>)>,
    path_set: HashSet<NodeId>,
    branch_state: HashMap<NodeId, usize>,
}

/// Run the narrative walk for every start event of a process, returning its lines.
pub fn walk_process(
    graph: &ProcessGraph,
    node_lane: &HashMap<NodeId, String>,
    artifacts: &HashMap<NodeId, Vec<Artifact>>,
) -> Vec<String> {
    let mut lines = Vec::new();
    for (idx, start_id) in graph.start_events.iter().enumerate() {
        let mut state = WalkState::default();
        let (branch_lines, _) = walk_node(graph, node_lane, artifacts, start_id, &[idx + 1], &mut state);
        lines.extend(branch_lines);
    }
    lines
}

fn walk_node(
    graph: &ProcessGraph,
    node_lane: &HashMap<NodeId, String>,
    artifacts: &HashMap<NodeId, Vec<Artifact>>,
    node_id: &str,
    numbering: &[usize],
    state: &mut WalkState,
) -> (Vec<String>, Vec<usize>) {
    let mut lines = Vec::new();

    let Some(node) = graph.nodes.get(node_id) else {
        return (lines, numbering.to_vec());
    };

    let indent = "    ".repeat(numbering.len().saturating_sub(1));
    let detail_indent = format!("{indent}    ");
    let num_str = format_number(numbering);

    if let Some((prev_str, prev_parts)) = state.number_map.get(node_id) {
        let label = match compare_parts(prev_parts, numbering) {
            std::cmp::Ordering::Less => "retorna para",
            std::cmp::Ordering::Greater => "avança para",
            std::cmp::Ordering::Equal => "referência",
        };
        lines.push(format!("{indent}({label} {prev_str})"));
        return (lines, numbering.to_vec());
    }

    if state.path_set.contains(node_id) {
        lines.push(format!("{indent}(loop em {num_str})"));
        return (lines, numbering.to_vec());
    }

    let outs = graph.outgoing_of(node_id).to_vec();
    let incoming_count = graph.incoming_of(node_id).len();
    let is_gateway = node.is_gateway();
    let is_diverging = is_gateway && outs.len() > 1;
    let is_converging = is_gateway && incoming_count > 1 && outs.len() == 1 && !is_diverging;
    let is_parallel_convergence = is_converging && node.is_parallel_gateway();

    if is_converging && !outs.is_empty() && !is_parallel_convergence {
        state.number_map.insert(node_id.to_string(), (num_str.clone(), numbering.to_vec()));
        state.path_set.insert(node_id.to_string());
        let next_id = graph.flows[&outs[0]].target.clone();
        let (child_lines, last_num) = walk_node(graph, node_lane, artifacts, &next_id, numbering, state);
        lines.extend(child_lines);
        return (lines, last_num);
    }

    let desc = if is_parallel_convergence {
        "Fim do Gateway Paralelo (convergência)".to_string()
    } else {
        describe_node(node)
    };
    lines.push(format!("{indent}{num_str}. {desc}"));

    match &node.kind {
        NodeKind::Task(kind) => {
            let actor = node_lane.get(node_id).map(String::as_str).unwrap_or(UNKNOWN_ACTOR);
            lines.push(format!("{detail_indent}Ator: {actor} | Tipo: {}", kind.detail_label()));
        }
        NodeKind::Subprocess(_) => {
            let actor = node_lane.get(node_id).map(String::as_str).unwrap_or(UNKNOWN_ACTOR);
            lines.push(format!("{detail_indent}Ator: {actor}"));
        }
        _ => {}
    }

    if let Some(attached) = artifacts.get(node_id) {
        let mut docs: Vec<&str> = attached
            .iter()
            .filter(|a| a.kind == ArtifactKind::Document)
            .map(|a| a.text.as_str())
            .collect();
        docs.sort_unstable();
        docs.dedup();
        let mut systems: Vec<&str> = attached
            .iter()
            .filter(|a| a.kind == ArtifactKind::System)
            .map(|a| a.text.as_str())
            .collect();
        systems.sort_unstable();
        systems.dedup();

        if !docs.is_empty() || !systems.is_empty() {
            let mut parts = Vec::new();
            if !systems.is_empty() {
                parts.push(format!("Sistema: {}", systems.join(", ")));
            }
            if !docs.is_empty() {
                parts.push(format!("Documento: {}", docs.join(", ")));
            }
            lines.push(format!("{detail_indent}{}", parts.join(" | ")));
        }

        let mut seen_notes = HashSet::new();
        for a in attached.iter().filter(|a| a.kind == ArtifactKind::Annotation) {
            let key = clean_note(&a.text);
            if !key.is_empty() && seen_notes.insert(key.clone()) {
                lines.push(format!("{detail_indent}Anotação: \"{key}\""));
            }
        }
    }

    state.number_map.insert(node_id.to_string(), (num_str, numbering.to_vec()));
    state.path_set.insert(node_id.to_string());

    let mut last_used = numbering.to_vec();

    if is_diverging {
        let branch_indent = &detail_indent;
        let next_counter = state.branch_state.entry(node_id.to_string()).or_insert(1);
        let mut counter = *next_counter;
        for (branch_idx, flow_id) in outs.iter().enumerate() {
            let child_num = counter;
            counter += 1;
            let flow = &graph.flows[flow_id];
            let child = flow.target.clone();
            let flow_name = flow.name.as_deref().unwrap_or("");
            let branch = if flow_name.is_empty() && node.is_parallel_gateway() {
                format!("Caminho {:02}", branch_idx + 1)
            } else if !flow_name.is_empty() {
                flow_name.to_string()
            } else {
                format!("Caminho {child_num}")
            };
            lines.push(format!("{branch_indent}Caso {branch}:"));

            let mut child_numbering = numbering.to_vec();
            child_numbering.push(child_num);
            child_numbering.push(1);
            let (child_lines, last_num) = walk_node(graph, node_lane, artifacts, &child, &child_numbering, state);
            lines.extend(child_lines);
            last_used = last_num.clone();
            if last_num.len() > numbering.len() {
                let suffix = last_num[numbering.len()];
                counter = counter.max(suffix + 1);
            }
        }
        *state.branch_state.get_mut(node_id).unwrap() = counter;
    } else if outs.len() == 1 {
        let next_id = graph.flows[&outs[0]].target.clone();
        let mut next_number = numbering.to_vec();
        let last = next_number.len() - 1;
        next_number[last] += 1;
        let (child_lines, last_num) = walk_node(graph, node_lane, artifacts, &next_id, &next_number, state);
        lines.extend(child_lines);
        last_used = last_num;
    }

    (lines, last_used)
}
