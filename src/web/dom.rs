//! Live-document [`HeadMorph`] implementation.

use crate::head::{HeadElement, HeadMorph, PERMITTED_TAGS};
use std::cell::{Cell, RefCell};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlHeadElement};

/// Converges the live `<head>` to the descriptor set of the last morph.
///
/// On the first morph the server-rendered permitted-tag children are adopted
/// as managed nodes, so hydration does not tear down and re-insert metadata
/// the server already emitted (re-inserting an identical `<script>` would
/// re-execute it). Afterwards each morph removes managed nodes absent from
/// the desired set and appends nodes for new descriptors; nodes whose
/// descriptor is unchanged are left untouched, which makes repeated morphs
/// with the same set mutation-free.
///
/// Unmanaged head children (charset meta, the title, anything injected by
/// third-party scripts) are never touched.
#[derive(Default)]
pub struct DomHeadMorpher {
    managed: RefCell<Vec<(HeadElement, Element)>>,
    adopted: Cell<bool>,
}

impl DomHeadMorpher {
    /// Create a morpher that has not adopted the server-rendered head yet.
    pub fn new() -> Self {
        Self::default()
    }

    fn adopt(&self, head: &HtmlHeadElement) {
        let mut managed = self.managed.borrow_mut();
        let children = head.child_nodes();
        for i in 0..children.length() {
            let Some(element) = children.item(i).and_then(|n| n.dyn_into::<Element>().ok())
            else {
                continue;
            };
            let descriptor = describe(&element);
            if PERMITTED_TAGS.contains(&descriptor.tag.as_str()) {
                managed.push((descriptor, element));
            }
        }
        crate::debug_log!("adopted {} server-rendered head elements", managed.len());
    }
}

/// Descriptor for a live element, shaped exactly like the wire form so
/// adopted nodes compare equal to their incoming descriptors.
fn describe(element: &Element) -> HeadElement {
    let mut descriptor = HeadElement::new(element.tag_name().to_lowercase());
    let attributes = element.attributes();
    for i in 0..attributes.length() {
        if let Some(attr) = attributes.item(i) {
            descriptor.attributes.insert(attr.name(), attr.value());
        }
    }
    descriptor.title = element.text_content().filter(|text| !text.is_empty());
    descriptor
}

fn create(document: &Document, descriptor: &HeadElement) -> Option<Element> {
    let element = document.create_element(&descriptor.tag).ok()?;
    for (name, value) in &descriptor.attributes {
        if element.set_attribute(name, value).is_err() {
            crate::warn_log!("head element rejected attribute '{}'", name);
        }
    }
    if let Some(text) = &descriptor.title {
        element.set_text_content(Some(text));
    }
    Some(element)
}

impl HeadMorph for DomHeadMorpher {
    fn set_title(&self, title: &str) {
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            document.set_title(title);
        }
    }

    fn morph_head(&self, desired: &[HeadElement]) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Some(head) = document.head() else {
            return;
        };
        if !self.adopted.get() {
            self.adopt(&head);
            self.adopted.set(true);
        }

        let mut managed = self.managed.borrow_mut();
        managed.retain(|(descriptor, element)| {
            if desired.contains(descriptor) {
                true
            } else {
                element.remove();
                false
            }
        });
        for descriptor in desired {
            if managed.iter().any(|(existing, _)| existing == descriptor) {
                continue;
            }
            let Some(element) = create(&document, descriptor) else {
                crate::warn_log!("could not create head element '{}'", descriptor.tag);
                continue;
            };
            if head.append_child(&element).is_ok() {
                managed.push((descriptor.clone(), element));
            }
        }
    }
}
