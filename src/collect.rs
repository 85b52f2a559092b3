//! Stage 3: Element Collector — turn one `process` subtree into node/flow maps.
//!
//! Only *direct* children of the process element are collected as nodes and flows,
//! so elements nested inside a `subProcess` are left out of this graph; the
//! sub-process itself is an atomic node.

use std::collections::HashMap;

use crate::dom::{Dom, ElementRef};
use crate::model::{
    CatchThrow, EventData, EventPosition, FlowId, GatewayKind, Node, NodeId, NodeKind,
    SequenceFlow, SubprocessKind, TaskKind,
};

/// Small ordered multimap: insertion order of *names* matters for link resolution
/// (graph repair picks "the first throw ... whose outgoing is non-empty" in
/// document order), which a `HashMap` cannot offer.
pub type LinkGroups = Vec<(String, Vec<NodeId>)>;

fn push_link(groups: &mut LinkGroups, name: &str, id: NodeId) {
    match groups.iter_mut().find(|(n, _)| n == name) {
        Some((_, ids)) => ids.push(id),
        None => groups.push((name.to_string(), vec![id])),
    }
}

pub(crate) fn find_link<'a>(groups: &'a LinkGroups, name: &str) -> Option<&'a [NodeId]> {
    groups.iter().find(|(n, _)| n == name).map(|(_, ids)| ids.as_slice())
}

#[derive(Debug, Default)]
pub struct ProcessGraph {
    pub id: String,
    pub name: Option<String>,
    pub nodes: HashMap<NodeId, Node>,
    pub flows: HashMap<FlowId, SequenceFlow>,
    pub outgoing: HashMap<NodeId, Vec<FlowId>>,
    pub incoming: HashMap<NodeId, Vec<FlowId>>,
    pub start_events: Vec<NodeId>,
    /// Link name -> catch node ids, in document order. Populated regardless of
    /// whether a matching throw exists; `crate::links` filters to complete pairs.
    pub catch_links: LinkGroups,
    /// Link name -> throw node ids, in document order.
    pub throw_links: LinkGroups,
}

impl ProcessGraph {
    pub fn outgoing_of(&self, id: &str) -> &[FlowId] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn incoming_of(&self, id: &str) -> &[FlowId] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Tag-to-category table for classifying process child elements into node kinds.
fn node_kind_for_tag(tag: &str, event: Option<EventData>) -> Option<NodeKind> {
    Some(match tag {
        "task" => NodeKind::Task(TaskKind::Generic),
        "userTask" => NodeKind::Task(TaskKind::User),
        "serviceTask" => NodeKind::Task(TaskKind::Service),
        "sendTask" => NodeKind::Task(TaskKind::Send),
        "receiveTask" => NodeKind::Task(TaskKind::Receive),
        "manualTask" => NodeKind::Task(TaskKind::Manual),
        "subProcess" => NodeKind::Subprocess(SubprocessKind::Inline),
        "callActivity" => NodeKind::Subprocess(SubprocessKind::CallActivity),
        "exclusiveGateway" => NodeKind::Gateway(GatewayKind::Exclusive),
        "parallelGateway" => NodeKind::Gateway(GatewayKind::Parallel),
        "inclusiveGateway" => NodeKind::Gateway(GatewayKind::Inclusive),
        "eventBasedGateway" => NodeKind::Gateway(GatewayKind::EventBased),
        "startEvent" | "endEvent" | "intermediateThrowEvent" | "intermediateCatchEvent"
        | "boundaryEvent" => NodeKind::Event(event.unwrap_or_default()),
        _ => return None,
    })
}

fn event_position(tag: &str) -> Option<EventPosition> {
    Some(match tag {
        "startEvent" => EventPosition::Start,
        "endEvent" => EventPosition::End,
        "intermediateThrowEvent" => EventPosition::IntermediateThrow,
        "intermediateCatchEvent" => EventPosition::IntermediateCatch,
        "boundaryEvent" => EventPosition::Boundary,
        _ => return None,
    })
}

const NODE_TAGS: &[&str] = &[
    "task",
    "userTask",
    "serviceTask",
    "sendTask",
    "receiveTask",
    "manualTask",
    "subProcess",
    "callActivity",
    "exclusiveGateway",
    "parallelGateway",
    "inclusiveGateway",
    "eventBasedGateway",
    "startEvent",
    "endEvent",
    "intermediateThrowEvent",
    "intermediateCatchEvent",
    "boundaryEvent",
];

/// Scan an event element's direct children for the first whose local name ends
/// with `EventDefinition`; the prefix becomes the flavor, its `name` attribute
/// (trimmed) becomes the link name candidate. First definition wins.
fn event_definition(dom: &Dom, idx: ElementRef) -> (String, Option<String>) {
    for child in dom.children(idx) {
        let tag = &dom.get(child).local_name;
        if let Some(flavor) = tag.strip_suffix("EventDefinition") {
            let link_name = dom
                .attr(child, "name")
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty());
            return (flavor.to_string(), link_name);
        }
    }
    (String::new(), None)
}

fn node_name(dom: &Dom, idx: ElementRef) -> Option<String> {
    dom.attr(idx, "name").filter(|n| !n.is_empty()).map(str::to_string)
}

fn flow_label(dom: &Dom, idx: ElementRef) -> Option<String> {
    dom.attr(idx, "name")
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

/// Collect nodes, sequence flows and adjacency for a single `process` element, then
/// mark link catch/throw pairs that share a name. Graph repair (splicing/dead-throw
/// wiring) happens afterwards in `crate::links`.
pub fn collect_process(dom: &Dom, proc: ElementRef) -> ProcessGraph {
    let id = dom.attr(proc, "id").unwrap_or_default().to_string();
    let name = dom.attr(proc, "name").filter(|n| !n.is_empty()).map(str::to_string);

    let mut nodes: HashMap<NodeId, Node> = HashMap::new();
    let mut start_events = Vec::new();
    // link name -> catch/throw ids, preserving document order for determinism.
    let mut catch_links: LinkGroups = Vec::new();
    let mut throw_links: LinkGroups = Vec::new();

    for &tag in NODE_TAGS {
        for el in dom.child_elements(proc, tag) {
            let node_id = match dom.attr(el, "id") {
                Some(id) => id.to_string(),
                None => continue,
            };
            let is_event = event_position(tag).is_some();
            let event_data = if is_event {
                let (flavor, link_name) = event_definition(dom, el);
                Some(EventData {
                    position: event_position(tag),
                    flavor,
                    link_name,
                    catch_throw: None,
                })
            } else {
                None
            };

            if let Some(ed) = &event_data
                && let Some(link_name) = &ed.link_name
            {
                match tag {
                    "intermediateCatchEvent" => push_link(&mut catch_links, link_name, node_id.clone()),
                    "intermediateThrowEvent" => push_link(&mut throw_links, link_name, node_id.clone()),
                    _ => {}
                }
            }

            let Some(kind) = node_kind_for_tag(tag, event_data) else {
                continue;
            };

            if tag == "startEvent" {
                start_events.push(node_id.clone());
            }

            nodes.insert(
                node_id.clone(),
                Node {
                    id: node_id,
                    name: node_name(dom, el),
                    kind,
                },
            );
        }
    }

    // Mark catch_throw only for link names with at least one catch AND one throw.
    for (link_name, catch_ids) in &catch_links {
        if let Some(throw_ids) = find_link(&throw_links, link_name) {
            if throw_ids.is_empty() {
                continue;
            }
            for cid in catch_ids {
                if let Some(Node { kind: NodeKind::Event(ed), .. }) = nodes.get_mut(cid) {
                    ed.catch_throw = Some(CatchThrow::Catch);
                }
            }
            for tid in throw_ids {
                if let Some(Node { kind: NodeKind::Event(ed), .. }) = nodes.get_mut(tid) {
                    ed.catch_throw = Some(CatchThrow::Throw);
                }
            }
        }
    }

    let mut flows = HashMap::new();
    let mut outgoing: HashMap<NodeId, Vec<FlowId>> = HashMap::new();
    let mut incoming: HashMap<NodeId, Vec<FlowId>> = HashMap::new();

    for el in dom.child_elements(proc, "sequenceFlow") {
        let Some(flow_id) = dom.attr(el, "id") else {
            continue;
        };
        let flow_id = flow_id.to_string();
        let source = dom.attr(el, "sourceRef").unwrap_or_default().to_string();
        let target = dom.attr(el, "targetRef").unwrap_or_default().to_string();
        outgoing.entry(source.clone()).or_default().push(flow_id.clone());
        incoming.entry(target.clone()).or_default().push(flow_id.clone());
        flows.insert(
            flow_id.clone(),
            SequenceFlow {
                id: flow_id,
                name: flow_label(dom, el),
                source,
                target,
                synthetic: false,
            },
        );
    }

    ProcessGraph {
        id,
        name,
        nodes,
        flows,
        outgoing,
        incoming,
        start_events,
        catch_links,
        throw_links,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::reader::read_dom;

    #[test]
    fn collects_linear_process() {
        let xml = br#"
        <definitions>
          <process id="P1">
            <startEvent id="s1" />
            <task id="t1" name="A" />
            <endEvent id="e1" />
            <sequenceFlow id="f1" sourceRef="s1" targetRef="t1" />
            <sequenceFlow id="f2" sourceRef="t1" targetRef="e1" />
          </process>
        </definitions>"#;
        let dom = read_dom(xml).unwrap();
        let root = dom.root().unwrap();
        let proc = dom.child_elements(root, "process").next().unwrap();
        let graph = collect_process(&dom, proc);
        assert_eq!(graph.id, "P1");
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.start_events, vec!["s1".to_string()]);
        assert_eq!(graph.outgoing_of("s1"), &["f1".to_string()]);
        assert_eq!(graph.outgoing_of("t1"), &["f2".to_string()]);
    }

    #[test]
    fn marks_catch_throw_only_when_both_present() {
        let xml = br#"
        <definitions>
          <process id="P1">
            <intermediateThrowEvent id="th1"><linkEventDefinition name="L" /></intermediateThrowEvent>
            <intermediateCatchEvent id="ca1"><linkEventDefinition name="L" /></intermediateCatchEvent>
            <intermediateThrowEvent id="th2"><linkEventDefinition name="Solo" /></intermediateThrowEvent>
          </process>
        </definitions>"#;
        let dom = read_dom(xml).unwrap();
        let root = dom.root().unwrap();
        let proc = dom.child_elements(root, "process").next().unwrap();
        let graph = collect_process(&dom, proc);
        let th1 = &graph.nodes["th1"];
        let ca1 = &graph.nodes["ca1"];
        let th2 = &graph.nodes["th2"];
        match &th1.kind {
            NodeKind::Event(ed) => assert_eq!(ed.catch_throw, Some(CatchThrow::Throw)),
            _ => panic!(),
        }
        match &ca1.kind {
            NodeKind::Event(ed) => assert_eq!(ed.catch_throw, Some(CatchThrow::Catch)),
            _ => panic!(),
        }
        match &th2.kind {
            NodeKind::Event(ed) => assert_eq!(ed.catch_throw, None),
            _ => panic!(),
        }
    }
}
