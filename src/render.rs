//! Pipeline orchestration: load XML, walk every process, assemble the document.

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};

use crate::artifacts::collect_artifacts;
use crate::collect::collect_process;
use crate::dom::reader::read_dom;
use crate::dom::ElementRef;
use crate::error::{Error, Result, NO_PROCESS_FOUND};
use crate::lanes::{collect_di_bounds, collect_lanes, infer_lanes};
use crate::links::repair_links;
use crate::walk::walk_process;

/// Render a BPMN XML document into its Portuguese textual narrative.
///
/// `filename` is used only as the fallback process title when neither the process
/// nor its owning participant carries a name.
pub fn render(bytes: &[u8], filename: &str) -> Result<String> {
    info!("rendering bpmn document ({} bytes)", bytes.len());
    let dom = read_dom(bytes)?;
    let Some(defs) = dom.root() else {
        return Err(Error::BpmnRequirement(NO_PROCESS_FOUND.to_string()));
    };

    let processes: Vec<ElementRef> = dom.child_elements(defs, "process").collect();
    if processes.is_empty() {
        return Err(Error::BpmnRequirement(NO_PROCESS_FOUND.to_string()));
    }
    debug!("found {} process definitions", processes.len());

    let mut participant_by_proc: HashMap<String, String> = HashMap::new();
    let mut participant_by_id: HashMap<String, String> = HashMap::new();
    for collab in dom.child_elements(defs, "collaboration") {
        for part in dom.child_elements(collab, "participant") {
            let pref = dom.attr(part, "processRef").map(str::to_string);
            let pid = dom.attr(part, "id").map(str::to_string);
            let name = dom.attr(part, "name").unwrap_or("").trim().to_string();
            if let Some(pref) = &pref {
                participant_by_proc.insert(pref.clone(), name.clone());
            }
            if let Some(pid) = pid {
                let resolved = if !name.is_empty() {
                    name
                } else {
                    pref.as_ref().and_then(|p| participant_by_proc.get(p)).cloned().unwrap_or_default()
                };
                participant_by_id.insert(pid, resolved);
            }
        }
    }

    let graphs: Vec<_> = processes
        .iter()
        .map(|&proc| {
            let mut graph = collect_process(&dom, proc);
            repair_links(&mut graph);
            (proc, graph)
        })
        .collect();

    let all_node_ids: HashSet<String> = graphs.iter().flat_map(|(_, g)| g.nodes.keys().cloned()).collect();

    for (_, graph) in &graphs {
        for flow in graph.flows.values() {
            if !graph.nodes.contains_key(&flow.source) {
                warn!("process {}: sequenceFlow {} has a dangling sourceRef {}", graph.id, flow.id, flow.source);
            }
            if !graph.nodes.contains_key(&flow.target) {
                warn!("process {}: sequenceFlow {} has a dangling targetRef {}", graph.id, flow.id, flow.target);
            }
        }
    }

    let artifacts_global = collect_artifacts(&dom, defs, &all_node_ids);

    let mut node_to_pool: HashMap<String, String> = HashMap::new();
    let mut node_title: HashMap<String, String> = HashMap::new();
    let mut node_category: HashMap<String, String> = HashMap::new();
    let mut node_name: HashMap<String, Option<String>> = HashMap::new();

    for (proc, graph) in &graphs {
        let proc_id = dom.attr(*proc, "id").unwrap_or_default().to_string();
        for (nid, node) in &graph.nodes {
            node_to_pool.insert(nid.clone(), proc_id.clone());
            node_title.entry(nid.clone()).or_insert_with(String::new);
            node_category.insert(nid.clone(), node.category_label().to_string());
            node_name.insert(nid.clone(), node.name.clone());
        }
    }

    let mut all_lines: Vec<String> = Vec::new();

    for (proc, graph) in &graphs {
        let proc_id = dom.attr(*proc, "id").unwrap_or_default().to_string();
        if graph.start_events.is_empty() {
            continue;
        }

        let lane_bindings = collect_lanes(&dom, *proc);
        let node_ids: HashSet<String> = graph.nodes.keys().cloned().collect();
        let lane_ids: HashSet<String> = lane_bindings.lane_name.keys().cloned().collect();
        let di_bounds = collect_di_bounds(&dom, defs, &node_ids, &lane_ids);
        let node_lane = infer_lanes(
            graph.nodes.keys().cloned(),
            lane_bindings.node_lane,
            &lane_bindings.lane_name,
            &di_bounds.node_bounds,
            &di_bounds.lane_bounds,
        );

        let title = graph
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| participant_by_proc.get(&proc_id).filter(|n| !n.is_empty()).cloned())
            .unwrap_or_else(|| filename.to_string());

        for nid in graph.nodes.keys() {
            node_title.insert(nid.clone(), title.clone());
        }

        let mut lines = vec![format!("Titulo: {title}")];
        lines.extend(walk_process(graph, &node_lane, &artifacts_global.by_node));
        all_lines.extend(lines);
        all_lines.push(String::new());
    }

    let mut msg_lines: Vec<String> = Vec::new();
    for collab in dom.child_elements(defs, "collaboration") {
        for mf in dom.child_elements(collab, "messageFlow") {
            let Some(src) = dom.attr(mf, "sourceRef") else { continue };
            let Some(tgt) = dom.attr(mf, "targetRef") else { continue };
            let (src, tgt) = (src.to_string(), tgt.to_string());

            let src_proc = node_to_pool.get(&src).cloned().unwrap_or_default();
            let tgt_proc = node_to_pool.get(&tgt).cloned().unwrap_or_default();

            let mut src_pool = participant_by_id.get(&src).filter(|n| !n.is_empty()).cloned()
                .or_else(|| participant_by_proc.get(&src_proc).filter(|n| !n.is_empty()).cloned())
                .unwrap_or_else(|| src_proc.clone());
            let mut tgt_pool = participant_by_id.get(&tgt).filter(|n| !n.is_empty()).cloned()
                .or_else(|| participant_by_proc.get(&tgt_proc).filter(|n| !n.is_empty()).cloned())
                .unwrap_or_else(|| tgt_proc.clone());

            let src_elem = if let Some(title) = node_title.get(&src) {
                if src_pool.is_empty() {
                    src_pool = title.clone();
                }
                node_name.get(&src).cloned().flatten().unwrap_or_else(|| node_category[&src].clone())
            } else {
                src.clone()
            };
            let tgt_elem = if let Some(title) = node_title.get(&tgt) {
                if tgt_pool.is_empty() {
                    tgt_pool = title.clone();
                }
                node_name.get(&tgt).cloned().flatten().unwrap_or_else(|| node_category[&tgt].clone())
            } else {
                tgt.clone()
            };

            let mf_name = dom.attr(mf, "name").unwrap_or("").trim().to_string();
            let mf_name = if mf_name.is_empty() { "(sem nome)".to_string() } else { mf_name };

            msg_lines.push(format!("- {src_pool} / {src_elem} | {tgt_pool} / {tgt_elem} | {mf_name}"));
        }
    }

    if !msg_lines.is_empty() {
        all_lines.push("Interações entre processos (message flows):".to_string());
        all_lines.push("- Origem (Processo / Elemento) | Destino (Processo / Elemento) | Mensagem".to_string());
        all_lines.extend(msg_lines);
    }

    if !artifacts_global.orphan_annotations.is_empty() {
        all_lines.push(String::new());
        all_lines.push("Anotações não ligadas a elementos:".to_string());
        let mut seen = HashSet::new();
        for text in &artifacts_global.orphan_annotations {
            let key = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !key.is_empty() && seen.insert(key.clone()) {
                all_lines.push(format!("- \"{key}\""));
            }
        }
    }

    Ok(all_lines.join("\n").trim_end().to_string())
}

/// Render a BPMN file from disk, using its filename stem as the title fallback.
pub fn render_from_path(path: &std::path::Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("arquivo");
    render(&bytes, stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_simple_linear_process() {
        let xml = br#"
        <definitions>
          <process id="P1" name="Pedido">
            <startEvent id="s1" />
            <task id="t1" name="Receber pedido" />
            <endEvent id="e1" />
            <sequenceFlow id="f1" sourceRef="s1" targetRef="t1" />
            <sequenceFlow id="f2" sourceRef="t1" targetRef="e1" />
          </process>
        </definitions>"#;
        let out = render(xml, "arquivo").unwrap();
        assert!(out.starts_with("Titulo: Pedido"));
        assert!(out.contains("Atividade: Receber pedido"));
    }

    #[test]
    fn rejects_document_without_process() {
        let xml = br#"<definitions></definitions>"#;
        assert!(render(xml, "arquivo").is_err());
    }
}
