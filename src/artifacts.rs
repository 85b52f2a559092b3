//! Stage 5b: Artifact Collector — attach annotations, documents and systems to nodes.
//!
//! Scans the whole `definitions` tree (artifacts and associations are not scoped to
//! a single process), builds one id-keyed table of candidate artifacts, then walks
//! every association-like element and attaches whichever endpoint is the artifact
//! to whichever endpoint is a known node.

use std::collections::{HashMap, HashSet};

use log::warn;

use crate::dom::{Dom, ElementRef};
use crate::model::{Artifact, ArtifactKind, NodeId};

#[derive(Debug, Default)]
pub struct ArtifactsResult {
    pub by_node: HashMap<NodeId, Vec<Artifact>>,
    pub orphan_annotations: Vec<String>,
}

fn collect_annotations(dom: &Dom, defs: ElementRef) -> HashMap<String, Artifact> {
    let mut out = HashMap::new();
    for ta in dom.descendants_named(defs, "textAnnotation").collect::<Vec<_>>() {
        let Some(id) = dom.attr(ta, "id") else { continue };
        let Some(text) = dom.child_text(ta, "text") else { continue };
        if text.is_empty() {
            continue;
        }
        out.insert(id.to_string(), Artifact { kind: ArtifactKind::Annotation, text });
    }
    out
}

fn collect_documents(dom: &Dom, defs: ElementRef) -> HashMap<String, Artifact> {
    let mut defined_names: HashMap<String, String> = HashMap::new();
    for dobj in dom.descendants_named(defs, "dataObject").collect::<Vec<_>>() {
        let Some(id) = dom.attr(dobj, "id") else { continue };
        let name = dom.attr(dobj, "name").unwrap_or("").trim().to_string();
        defined_names.insert(id.to_string(), name);
    }

    let mut out = HashMap::new();
    for dref in dom.descendants_named(defs, "dataObjectReference").collect::<Vec<_>>() {
        let Some(id) = dom.attr(dref, "id") else { continue };
        let underlying = dom.attr(dref, "dataObjectRef");
        let mut name = dom.attr(dref, "name").unwrap_or("").trim().to_string();
        if name.is_empty() {
            if let Some(u) = underlying {
                name = defined_names.get(u).cloned().unwrap_or_default();
            }
        }
        let name = if name.is_empty() { id.to_string() } else { name };
        out.insert(id.to_string(), Artifact { kind: ArtifactKind::Document, text: name });
    }
    for dobj in dom.descendants_named(defs, "dataObject").collect::<Vec<_>>() {
        let Some(id) = dom.attr(dobj, "id") else { continue };
        let name = dom.attr(dobj, "name").unwrap_or("").trim().to_string();
        let name = if name.is_empty() { id.to_string() } else { name };
        out.insert(id.to_string(), Artifact { kind: ArtifactKind::Document, text: name });
    }
    out
}

fn collect_systems(dom: &Dom, defs: ElementRef) -> HashMap<String, Artifact> {
    let mut defined_names: HashMap<String, String> = HashMap::new();
    for ds in dom.descendants_named(defs, "dataStore").collect::<Vec<_>>() {
        let Some(id) = dom.attr(ds, "id") else { continue };
        let name = dom.attr(ds, "name").unwrap_or("").trim().to_string();
        defined_names.insert(id.to_string(), name);
    }

    let mut out = HashMap::new();
    for dref in dom.descendants_named(defs, "dataStoreReference").collect::<Vec<_>>() {
        let Some(id) = dom.attr(dref, "id") else { continue };
        let underlying = dom.attr(dref, "dataStoreRef");
        let mut name = dom.attr(dref, "name").unwrap_or("").trim().to_string();
        if name.is_empty() {
            if let Some(u) = underlying {
                name = defined_names.get(u).cloned().unwrap_or_default();
            }
        }
        let name = if name.is_empty() { id.to_string() } else { name };
        out.insert(id.to_string(), Artifact { kind: ArtifactKind::System, text: name });
    }
    out
}

fn assoc_endpoints(dom: &Dom, assoc: ElementRef) -> (Vec<String>, Vec<String>) {
    let tag = dom.get(assoc).local_name.as_str();
    if tag == "association" {
        let src = dom.attr(assoc, "sourceRef").map(str::to_string).into_iter().collect();
        let tgt = dom.attr(assoc, "targetRef").map(str::to_string).into_iter().collect();
        (src, tgt)
    } else {
        let srcs: Vec<String> = dom
            .child_elements(assoc, "sourceRef")
            .map(|c| dom.get(c).text.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        let tgt: Vec<String> = dom
            .child_elements(assoc, "targetRef")
            .next()
            .map(|c| dom.get(c).text.trim().to_string())
            .filter(|t| !t.is_empty())
            .into_iter()
            .collect();
        (srcs, tgt)
    }
}

/// Attach annotations/documents/systems to nodes via `association`,
/// `dataInputAssociation` and `dataOutputAssociation` elements anywhere under
/// `definitions`. Annotations that never attach to a known node are returned
/// separately as orphans.
pub fn collect_artifacts(dom: &Dom, defs: ElementRef, node_ids: &HashSet<NodeId>) -> ArtifactsResult {
    let annotations = collect_annotations(dom, defs);
    let documents = collect_documents(dom, defs);
    let systems = collect_systems(dom, defs);

    let mut artifacts: HashMap<String, Artifact> = HashMap::new();
    artifacts.extend(annotations.clone());
    artifacts.extend(documents);
    artifacts.extend(systems);

    let mut by_node: HashMap<NodeId, Vec<Artifact>> = HashMap::new();
    let mut attached_notes: HashSet<String> = HashSet::new();

    let mut attach = |src: &str, tgt: &str| {
        let mut attached = false;
        if let Some(a) = artifacts.get(src) {
            if node_ids.contains(tgt) {
                by_node.entry(tgt.to_string()).or_default().push(a.clone());
                if a.kind == ArtifactKind::Annotation {
                    attached_notes.insert(src.to_string());
                }
                attached = true;
            }
        }
        if let Some(a) = artifacts.get(tgt) {
            if node_ids.contains(src) {
                by_node.entry(src.to_string()).or_default().push(a.clone());
                if a.kind == ArtifactKind::Annotation {
                    attached_notes.insert(tgt.to_string());
                }
                attached = true;
            }
        }
        if !attached {
            warn!("association {src} -> {tgt} does not resolve to a known artifact/node pair, discarding");
        }
    };

    for assoc in dom.descendants_named(defs, "association").collect::<Vec<_>>() {
        let (srcs, tgts) = assoc_endpoints(dom, assoc);
        for (src, tgt) in srcs.iter().zip(tgts.iter()) {
            attach(src, tgt);
        }
    }
    for tag in ["dataInputAssociation", "dataOutputAssociation"] {
        for assoc in dom.descendants_named(defs, tag).collect::<Vec<_>>() {
            let (srcs, tgts) = assoc_endpoints(dom, assoc);
            let Some(tgt) = tgts.first() else { continue };
            for src in &srcs {
                attach(src, tgt);
            }
        }
    }

    let orphan_annotations = annotations
        .iter()
        .filter(|(id, _)| !attached_notes.contains(*id))
        .map(|(_, a)| a.text.clone())
        .collect();

    ArtifactsResult { by_node, orphan_annotations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::reader::read_dom;

    #[test]
    fn attaches_annotation_via_association() {
        let xml = br#"
        <definitions>
          <process id="P1">
            <task id="t1" />
            <textAnnotation id="ta1"><text>Nota importante</text></textAnnotation>
            <association id="a1" sourceRef="t1" targetRef="ta1" />
          </process>
        </definitions>"#;
        let dom = read_dom(xml).unwrap();
        let root = dom.root().unwrap();
        let mut ids = HashSet::new();
        ids.insert("t1".to_string());
        let result = collect_artifacts(&dom, root, &ids);
        let attached = &result.by_node["t1"];
        assert_eq!(attached.len(), 1);
        assert_eq!(attached[0].text, "Nota importante");
        assert!(result.orphan_annotations.is_empty());
    }

    #[test]
    fn reports_orphan_annotation() {
        let xml = br#"
        <definitions>
          <process id="P1">
            <task id="t1" />
            <textAnnotation id="ta1"><text>Solta</text></textAnnotation>
          </process>
        </definitions>"#;
        let dom = read_dom(xml).unwrap();
        let root = dom.root().unwrap();
        let mut ids = HashSet::new();
        ids.insert("t1".to_string());
        let result = collect_artifacts(&dom, root, &ids);
        assert_eq!(result.orphan_annotations, vec!["Solta".to_string()]);
    }

    #[test]
    fn resolves_document_name_from_definition() {
        let xml = br#"
        <definitions>
          <process id="P1">
            <task id="t1" />
            <dataObject id="d1" name="Pedido" />
            <dataObjectReference id="dr1" dataObjectRef="d1" />
            <dataOutputAssociation id="oa1">
              <sourceRef>t1</sourceRef>
              <targetRef>dr1</targetRef>
            </dataOutputAssociation>
          </process>
        </definitions>"#;
        let dom = read_dom(xml).unwrap();
        let root = dom.root().unwrap();
        let mut ids = HashSet::new();
        ids.insert("t1".to_string());
        let result = collect_artifacts(&dom, root, &ids);
        assert_eq!(result.by_node["t1"][0].text, "Pedido");
    }
}
