//! Stage 4: Graph Repair — synthesise sequence flows for link event pairs.
//!
//! Mutates the adjacency built by `crate::collect` in place, adding flows for link
//! events that have no authored connection; synthetic flows are flagged so the
//! walker can tell them apart from authored ones if it ever needs to.

use log::warn;

use crate::collect::{ProcessGraph, find_link};
use crate::model::SequenceFlow;

fn link_label(name: &str) -> String {
    if name.is_empty() {
        "Link".to_string()
    } else {
        format!("Link: {name}")
    }
}

/// Apply orphan-catch splicing then dead-throw wiring for every link name that has
/// at least one catch and at least one throw in this process. Link names with only
/// a catch or only a throw are permanently unmatched and left alone.
pub fn repair_links(graph: &mut ProcessGraph) {
    let mut link_names: Vec<String> = graph.catch_links.iter().map(|(n, _)| n.clone()).collect();
    for (name, _) in &graph.throw_links {
        if !link_names.contains(name) {
            link_names.push(name.clone());
        }
    }
    let mut synth_seq = 0usize;

    for name in &link_names {
        let catch_ids = match find_link(&graph.catch_links, name) {
            Some(ids) if !ids.is_empty() => ids.to_vec(),
            _ => {
                warn!("process {}: link '{name}' has a throw but no matching catch", graph.id);
                continue;
            }
        };
        let throw_ids = match find_link(&graph.throw_links, name) {
            Some(ids) if !ids.is_empty() => ids.to_vec(),
            _ => {
                warn!("process {}: link '{name}' has a catch but no matching throw", graph.id);
                continue;
            }
        };

        // Step 2: orphan-catch splicing. A catch with neither incoming nor outgoing
        // is spliced into the predecessor chain of the first throw's first target.
        for cid in &catch_ids {
            let has_incoming = !graph.incoming_of(cid).is_empty();
            if has_incoming {
                continue;
            }
            let has_outgoing = !graph.outgoing_of(cid).is_empty();
            if has_outgoing {
                continue;
            }

            for tid in &throw_ids {
                let Some(first_out) = graph.outgoing_of(tid).first().cloned() else {
                    continue;
                };
                let Some(target) = graph.flows.get(&first_out).map(|f| f.target.clone()) else {
                    continue;
                };

                let redirected: Vec<String> = graph
                    .incoming
                    .get(&target)
                    .cloned()
                    .unwrap_or_default();
                for inc_id in &redirected {
                    if let Some(flow) = graph.flows.get_mut(inc_id) {
                        flow.target = cid.clone();
                    }
                }
                graph
                    .incoming
                    .entry(cid.clone())
                    .or_default()
                    .extend(redirected);
                graph.incoming.remove(&target);

                let already_linked = graph
                    .outgoing_of(cid)
                    .iter()
                    .filter_map(|f| graph.flows.get(f))
                    .any(|f| f.target == target);
                if !already_linked {
                    synth_seq += 1;
                    let flow_id = format!("_linkcatch_{cid}_{target}_{synth_seq}");
                    graph.outgoing.entry(cid.clone()).or_default().push(flow_id.clone());
                    graph.incoming.entry(target.clone()).or_default().push(flow_id.clone());
                    graph.flows.insert(
                        flow_id.clone(),
                        SequenceFlow {
                            id: flow_id,
                            name: Some(link_label(name)),
                            source: cid.clone(),
                            target: target.clone(),
                            synthetic: true,
                        },
                    );
                }
                break;
            }
        }

        // Step 3: dead-throw wiring. A throw with no outgoing gets one synthetic
        // flow to every matching catch (fan-out, asymmetric with the splice above).
        for tid in &throw_ids {
            if !graph.outgoing_of(tid).is_empty() {
                continue;
            }
            for cid in &catch_ids {
                synth_seq += 1;
                let flow_id = format!("_link_{tid}_{cid}_{synth_seq}");
                graph.outgoing.entry(tid.clone()).or_default().push(flow_id.clone());
                graph.incoming.entry(cid.clone()).or_default().push(flow_id.clone());
                graph.flows.insert(
                    flow_id.clone(),
                    SequenceFlow {
                        id: flow_id,
                        name: Some(link_label(name)),
                        source: tid.clone(),
                        target: cid.clone(),
                        synthetic: true,
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::collect_process;
    use crate::dom::reader::read_dom;

    #[test]
    fn wires_dead_throw_to_catch() {
        let xml = br#"
        <definitions>
          <process id="P1">
            <intermediateThrowEvent id="th1"><linkEventDefinition name="L" /></intermediateThrowEvent>
            <intermediateCatchEvent id="ca1"><linkEventDefinition name="L" /></intermediateCatchEvent>
          </process>
        </definitions>"#;
        let dom = read_dom(xml).unwrap();
        let root = dom.root().unwrap();
        let proc = dom.child_elements(root, "process").next().unwrap();
        let mut graph = collect_process(&dom, proc);
        repair_links(&mut graph);
        assert_eq!(graph.outgoing_of("th1").len(), 1);
        let flow_id = &graph.outgoing_of("th1")[0];
        let flow = &graph.flows[flow_id];
        assert!(flow.synthetic);
        assert_eq!(flow.target, "ca1");
        assert_eq!(flow.name.as_deref(), Some("Link: L"));
    }

    #[test]
    fn splices_orphan_catch_into_predecessor_chain() {
        let xml = br#"
        <definitions>
          <process id="P1">
            <startEvent id="s1" />
            <intermediateThrowEvent id="th1"><linkEventDefinition name="L" /></intermediateThrowEvent>
            <intermediateCatchEvent id="ca1"><linkEventDefinition name="L" /></intermediateCatchEvent>
            <task id="t1" name="After" />
            <sequenceFlow id="f1" sourceRef="s1" targetRef="th1" />
            <sequenceFlow id="f2" sourceRef="th1" targetRef="t1" />
          </process>
        </definitions>"#;
        let dom = read_dom(xml).unwrap();
        let root = dom.root().unwrap();
        let proc = dom.child_elements(root, "process").next().unwrap();
        let mut graph = collect_process(&dom, proc);
        repair_links(&mut graph);
        // th1's original outgoing is non-empty, so dead-throw wiring does not fire;
        // instead the orphan catch ca1 is spliced between th1 and t1.
        assert!(graph.incoming_of("t1").iter().any(|f| graph.flows[f].source == "ca1"));
        assert!(graph.incoming_of("ca1").is_empty() == false || !graph.outgoing_of("ca1").is_empty());
    }

    #[test]
    fn no_splice_without_both_sides() {
        let xml = br#"
        <definitions>
          <process id="P1">
            <intermediateThrowEvent id="th1"><linkEventDefinition name="Solo" /></intermediateThrowEvent>
          </process>
        </definitions>"#;
        let dom = read_dom(xml).unwrap();
        let root = dom.root().unwrap();
        let proc = dom.child_elements(root, "process").next().unwrap();
        let mut graph = collect_process(&dom, proc);
        repair_links(&mut graph);
        assert!(graph.outgoing_of("th1").is_empty());
    }
}
