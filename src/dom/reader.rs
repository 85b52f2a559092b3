use crate::dom::{Dom, Element};
use crate::error::Result;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// Strip any namespace prefix (`bpmndi:BPMNPlane` -> `BPMNPlane`).
fn local_name(raw: &[u8]) -> String {
    let s = String::from_utf8_lossy(raw);
    match s.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => s.into_owned(),
    }
}

/// Parse a full BPMN XML byte buffer into a [`Dom`] tree.
///
/// Builds the tree with a stack of currently-open elements: push on open,
/// pop-and-attach on close.
pub fn read_dom(bytes: &[u8]) -> Result<Dom> {
    let text = std::str::from_utf8(bytes)?;
    let mut reader = Reader::from_str(text);
    {
        let config = reader.config_mut();
        config.trim_text_start = true;
        config.trim_text_end = true;
    }

    let mut elements: Vec<Element> = Vec::new();
    let mut stack: Vec<usize> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let parent = stack.last().copied();
                let mut element = Element::new(local_name(e.name().as_ref()), parent);
                for attr in e.attributes() {
                    let attr = attr?;
                    let key = local_name(attr.key.as_ref());
                    let value = attr.decode_and_unescape_value(reader.decoder())?.into_owned();
                    element.attrs.insert(key, value);
                }
                let idx = elements.len();
                elements.push(element);
                if let Some(parent) = parent {
                    elements[parent].children.push(idx);
                }
                stack.push(idx);
            }
            Event::Empty(e) => {
                let parent = stack.last().copied();
                let mut element = Element::new(local_name(e.name().as_ref()), parent);
                for attr in e.attributes() {
                    let attr = attr?;
                    let key = local_name(attr.key.as_ref());
                    let value = attr.decode_and_unescape_value(reader.decoder())?.into_owned();
                    element.attrs.insert(key, value);
                }
                let idx = elements.len();
                elements.push(element);
                if let Some(parent) = parent {
                    elements[parent].children.push(idx);
                }
            }
            Event::Text(e) => {
                if let Some(&top) = stack.last() {
                    let decoded = e.decode().map_err(quick_xml::Error::from)?;
                    let unescaped =
                        quick_xml::escape::unescape(&decoded).map_err(quick_xml::Error::from)?;
                    elements[top].text.push_str(&unescaped);
                }
            }
            Event::CData(e) => {
                if let Some(&top) = stack.last() {
                    elements[top].text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(Dom::new(elements))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_and_attrs() {
        let xml = br#"<definitions xmlns="ns"><process id="p1" name="Proc"><startEvent id="s1"/></process></definitions>"#;
        let dom = read_dom(xml).unwrap();
        let root = dom.root().unwrap();
        assert_eq!(dom.get(root).local_name, "definitions");
        let proc = dom.child_elements(root, "process").next().unwrap();
        assert_eq!(dom.attr(proc, "id"), Some("p1"));
        assert_eq!(dom.attr(proc, "name"), Some("Proc"));
        let start = dom.child_elements(proc, "startEvent").next().unwrap();
        assert_eq!(dom.attr(start, "id"), Some("s1"));
    }

    #[test]
    fn collects_trimmed_text() {
        let xml = br#"<root><textAnnotation><text>  hello world  </text></textAnnotation></root>"#;
        let dom = read_dom(xml).unwrap();
        let root = dom.root().unwrap();
        let ta = dom.child_elements(root, "textAnnotation").next().unwrap();
        assert_eq!(dom.child_text(ta, "text").as_deref(), Some("hello world"));
    }

    #[test]
    fn rejects_invalid_utf8() {
        let bytes = vec![0xff, 0xfe, 0x00];
        assert!(read_dom(&bytes).is_err());
    }
}
