//! Stage 5a: Lane Resolver — bind nodes to the lane (actor) they run in.
//!
//! Explicit `flowNodeRef` bindings take priority; geometric inference from the
//! diagram-interchange shapes fills in whatever is left unmapped.

use std::collections::{HashMap, HashSet};

use log::warn;

use crate::dom::{Dom, ElementRef};
use crate::model::{NodeId, Rect};

pub const UNKNOWN_ACTOR: &str = "(ator nao identificado)";

#[derive(Debug, Default)]
pub struct LaneBindings {
    pub node_lane: HashMap<NodeId, String>,
    pub lane_name: HashMap<String, String>,
}

/// Explicit lane membership from `laneSet`/`lane`/`flowNodeRef`, searched anywhere
/// under the process (lanes occasionally nest deeper than a direct child).
pub fn collect_lanes(dom: &Dom, proc: ElementRef) -> LaneBindings {
    let mut node_lane = HashMap::new();
    let mut lane_name = HashMap::new();

    for lane in dom.descendants_named(proc, "lane").collect::<Vec<_>>() {
        let lid = dom.attr(lane, "id").map(str::to_string);
        let lname = dom
            .attr(lane, "name")
            .filter(|n| !n.is_empty())
            .unwrap_or("(sem ator)")
            .to_string();
        if let Some(lid) = &lid {
            lane_name.insert(lid.clone(), lname.clone());
        }
        for flow_ref in dom.child_elements(lane, "flowNodeRef") {
            let text = dom.get(flow_ref).text.trim().to_string();
            if !text.is_empty() {
                node_lane.insert(text, lname.clone());
            }
        }
    }

    LaneBindings { node_lane, lane_name }
}

#[derive(Debug, Default)]
pub struct DiBounds {
    pub node_bounds: HashMap<NodeId, Rect>,
    pub lane_bounds: HashMap<String, Rect>,
}

fn parse_coord(dom: &Dom, bounds: ElementRef, attr: &str) -> f64 {
    dom.attr(bounds, attr).and_then(|v| v.parse().ok()).unwrap_or(0.0)
}

/// Collect `BPMNShape`/`Bounds` pairs anywhere under `definitions`, split into
/// node rectangles and lane rectangles by id-set membership.
pub fn collect_di_bounds(
    dom: &Dom,
    defs: ElementRef,
    node_ids: &HashSet<NodeId>,
    lane_ids: &HashSet<String>,
) -> DiBounds {
    let mut node_bounds = HashMap::new();
    let mut lane_bounds = HashMap::new();

    for shape in dom.descendants_named(defs, "BPMNShape").collect::<Vec<_>>() {
        let Some(elem_id) = dom.attr(shape, "bpmnElement") else {
            continue;
        };
        let elem_id = elem_id.to_string();
        let Some(bounds) = dom.child_elements(shape, "Bounds").next() else {
            continue;
        };
        let rect = Rect {
            x: parse_coord(dom, bounds, "x"),
            y: parse_coord(dom, bounds, "y"),
            w: parse_coord(dom, bounds, "width"),
            h: parse_coord(dom, bounds, "height"),
        };
        if node_ids.contains(&elem_id) {
            node_bounds.insert(elem_id.clone(), rect);
        }
        if lane_ids.contains(&elem_id) {
            lane_bounds.insert(elem_id, rect);
        }
    }

    DiBounds { node_bounds, lane_bounds }
}

/// Fill in lane assignment for nodes with no explicit `flowNodeRef` binding, using
/// shape-intersection ranking and falling back to centre-point containment.
pub fn infer_lanes(
    node_ids: impl Iterator<Item = NodeId>,
    mut node_lane: HashMap<NodeId, String>,
    lane_name: &HashMap<String, String>,
    node_bounds: &HashMap<NodeId, Rect>,
    lane_bounds: &HashMap<String, Rect>,
) -> HashMap<NodeId, String> {
    for node_id in node_ids {
        if node_lane.contains_key(&node_id) {
            continue;
        }
        let Some(rect) = node_bounds.get(&node_id) else {
            continue;
        };

        let mut overlaps: Vec<(f64, f64, &String)> = lane_bounds
            .iter()
            .map(|(lane_id, lrect)| (rect.intersection_area(lrect), lrect.area(), lane_id))
            .filter(|(inter, _, _)| *inter > 0.0)
            .collect();

        if !overlaps.is_empty() {
            overlaps.sort_by(|a, b| {
                b.0.partial_cmp(&a.0)
                    .unwrap()
                    .then(a.1.partial_cmp(&b.1).unwrap())
            });
            let top_area = overlaps[0].0;
            let top: Vec<_> = overlaps.iter().filter(|o| o.0 == top_area).collect();
            let chosen = top[0].2;
            let mut name = lane_name.get(chosen).cloned().unwrap_or_else(|| UNKNOWN_ACTOR.to_string());
            if top.len() > 1 {
                warn!("node {node_id}: {} lanes tie for largest intersection, assignment is ambiguous", top.len());
                name = format!("{name} (ambiguo)");
            }
            node_lane.insert(node_id, name);
            continue;
        }

        let (cx, cy) = rect.centre();
        let mut candidates: Vec<(f64, &String)> = lane_bounds
            .iter()
            .filter(|(_, lrect)| lrect.contains_point((cx, cy)))
            .map(|(lane_id, lrect)| (lrect.area(), lane_id))
            .collect();
        if !candidates.is_empty() {
            candidates.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
            let chosen = candidates[0].1;
            let mut name = lane_name.get(chosen).cloned().unwrap_or_else(|| UNKNOWN_ACTOR.to_string());
            if candidates.len() > 1 {
                warn!(
                    "node {node_id}: {} lanes contain its centre point, assignment is ambiguous",
                    candidates.len()
                );
                name = format!("{name} (ambiguo)");
            }
            node_lane.insert(node_id, name);
        }
    }
    node_lane
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::reader::read_dom;

    #[test]
    fn binds_explicit_flow_node_ref() {
        let xml = br#"
        <definitions>
          <process id="P1">
            <laneSet>
              <lane id="l1" name="Vendas">
                <flowNodeRef>t1</flowNodeRef>
              </lane>
            </laneSet>
            <task id="t1" />
          </process>
        </definitions>"#;
        let dom = read_dom(xml).unwrap();
        let root = dom.root().unwrap();
        let proc = dom.child_elements(root, "process").next().unwrap();
        let bindings = collect_lanes(&dom, proc);
        assert_eq!(bindings.node_lane.get("t1"), Some(&"Vendas".to_string()));
    }

    #[test]
    fn infers_lane_by_intersection() {
        let mut node_bounds = HashMap::new();
        node_bounds.insert("t1".to_string(), Rect { x: 5.0, y: 5.0, w: 10.0, h: 10.0 });
        let mut lane_bounds = HashMap::new();
        lane_bounds.insert("l1".to_string(), Rect { x: 0.0, y: 0.0, w: 20.0, h: 20.0 });
        let mut lane_name = HashMap::new();
        lane_name.insert("l1".to_string(), "Producao".to_string());
        let result = infer_lanes(
            vec!["t1".to_string()].into_iter(),
            HashMap::new(),
            &lane_name,
            &node_bounds,
            &lane_bounds,
        );
        assert_eq!(result.get("t1"), Some(&"Producao".to_string()));
    }
}
