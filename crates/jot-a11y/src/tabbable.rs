//! Focusable-set query
//!
//! A single pre-order walk decides which descendants of a container are
//! keyboard reachable. The result is never cached: callers recompute it on
//! every interaction so inserted or removed content is always respected.
//!
//! An element qualifies when it
//! - is interactive by HTML semantics or carries a `tabindex`,
//! - is not disabled (own attribute or a disabled `fieldset` ancestor),
//! - is not hidden (`display:none`, `hidden`, `inert` on itself or an
//!   ancestor; `visibility:hidden` or a zero-size box on itself).
//!
//! Sequential (Tab) order additionally drops negative `tabindex`. Order is
//! document position; positive `tabindex` values do not reorder.

use jot_dom::{Display, ElementData, NodeId, Visibility};

use crate::FocusHost;

/// Which `tabindex` values are admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admit {
    /// Sequential navigation: `tabindex >= 0` or implicit
    Tabbable,
    /// Anything that can take focus, including `tabindex = -1`
    Focusable,
}

/// Inherited walk state
#[derive(Debug, Clone, Copy, Default)]
struct Inherited {
    fieldset_disabled: bool,
}

/// Tab order of `container`'s descendants
pub fn tabbable<H: FocusHost + ?Sized>(host: &H, container: NodeId) -> Vec<NodeId> {
    collect(host, container, Admit::Tabbable)
}

/// Focusable descendants, including those removed from Tab order
pub fn focusable<H: FocusHost + ?Sized>(host: &H, container: NodeId) -> Vec<NodeId> {
    collect(host, container, Admit::Focusable)
}

pub fn first_tabbable<H: FocusHost + ?Sized>(host: &H, container: NodeId) -> Option<NodeId> {
    tabbable(host, container).first().copied()
}

pub fn last_tabbable<H: FocusHost + ?Sized>(host: &H, container: NodeId) -> Option<NodeId> {
    tabbable(host, container).last().copied()
}

/// `node` is in `container`'s current Tab order
pub fn is_tabbable<H: FocusHost + ?Sized>(host: &H, container: NodeId, node: NodeId) -> bool {
    tabbable(host, container).contains(&node)
}

fn suppresses_subtree(e: &ElementData) -> bool {
    e.display == Display::None || e.has_attr("hidden") || e.has_attr("inert")
}

fn is_rendered(e: &ElementData) -> bool {
    e.visibility == Visibility::Visible && !e.bounds.is_some_and(|b| b.is_zero_size())
}

/// State inherited from the container's own ancestors, or `None` when an
/// ancestor hides the whole container.
fn ancestry<H: FocusHost + ?Sized>(host: &H, container: NodeId) -> Option<Inherited> {
    let mut state = Inherited::default();
    let mut child = container;
    let mut current = Some(container);
    while let Some(id) = current {
        if let Some(e) = host.element(id) {
            if suppresses_subtree(e) {
                return None;
            }
            if id != container && e.tag == "fieldset" && e.has_attr("disabled") && !in_first_legend(host, id, child) {
                state.fieldset_disabled = true;
            }
        }
        child = id;
        current = host.parent(id);
    }
    Some(state)
}

/// `child` (a direct child of `fieldset`) is its first `<legend>`
fn in_first_legend<H: FocusHost + ?Sized>(host: &H, fieldset: NodeId, child: NodeId) -> bool {
    let first_legend = host.children(fieldset)
        .into_iter()
        .find(|&c| host.element(c).is_some_and(|e| e.tag == "legend"));
    first_legend == Some(child)
}

fn collect<H: FocusHost + ?Sized>(host: &H, container: NodeId, admit: Admit) -> Vec<NodeId> {
    if !host.is_attached(container) {
        return Vec::new();
    }
    let Some(root_state) = ancestry(host, container) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut stack: Vec<(NodeId, Inherited)> = host.children(container)
        .into_iter()
        .rev()
        .map(|c| (c, child_state(host, container, c, root_state)))
        .collect();

    while let Some((node, state)) = stack.pop() {
        let Some(e) = host.element(node) else {
            continue;
        };
        if suppresses_subtree(e) {
            continue;
        }

        let disabled = e.is_disabled() || (state.fieldset_disabled && e.is_form_control());
        let tab_index = e.tab_index();
        let can_focus = e.is_inherently_focusable() || tab_index.is_some();
        let in_sequence = tab_index.is_none_or(|n| n >= 0);
        let admitted = in_sequence || admit == Admit::Focusable;

        if can_focus && admitted && !disabled && is_rendered(e) {
            out.push(node);
        }

        let children = host.children(node);
        for &c in children.iter().rev() {
            stack.push((c, child_state(host, node, c, state)));
        }
    }
    out
}

fn child_state<H: FocusHost + ?Sized>(host: &H, parent: NodeId, child: NodeId, parent_state: Inherited) -> Inherited {
    let mut state = parent_state;
    if let Some(p) = host.element(parent) {
        if p.tag == "fieldset" && p.has_attr("disabled") && !in_first_legend(host, parent, child) {
            state.fieldset_disabled = true;
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use jot_dom::{Document, Rect};
    use proptest::prelude::*;

    fn add(doc: &mut Document, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let n = doc.create_element(tag);
        for (name, value) in attrs {
            doc.set_attribute(n, name, value).unwrap();
        }
        doc.append_child(parent, n).unwrap();
        n
    }

    fn container(doc: &mut Document) -> NodeId {
        let body = doc.body();
        add(doc, body, "div", &[])
    }

    #[test]
    fn test_document_order() {
        let mut doc = Document::new();
        let c = container(&mut doc);
        let a = add(&mut doc, c, "button", &[]);
        let group = add(&mut doc, c, "div", &[]);
        let b = add(&mut doc, group, "input", &[("type", "text")]);
        let link = add(&mut doc, c, "a", &[("href", "/entries/1")]);
        let custom = add(&mut doc, c, "div", &[("tabindex", "0")]);

        assert_eq!(tabbable(&doc, c), vec![a, b, link, custom]);
        assert_eq!(first_tabbable(&doc, c), Some(a));
        assert_eq!(last_tabbable(&doc, c), Some(custom));
    }

    #[test]
    fn test_positive_tabindex_keeps_document_order() {
        let mut doc = Document::new();
        let c = container(&mut doc);
        let a = add(&mut doc, c, "button", &[]);
        let b = add(&mut doc, c, "button", &[("tabindex", "5")]);
        assert_eq!(tabbable(&doc, c), vec![a, b]);
    }

    #[test]
    fn test_exclusions() {
        let mut doc = Document::new();
        let c = container(&mut doc);
        let ok = add(&mut doc, c, "button", &[]);
        add(&mut doc, c, "button", &[("disabled", "")]);
        add(&mut doc, c, "button", &[("tabindex", "-1")]);
        add(&mut doc, c, "input", &[("type", "hidden")]);
        add(&mut doc, c, "a", &[]);
        add(&mut doc, c, "div", &[]);
        let hidden_group = add(&mut doc, c, "div", &[("hidden", "")]);
        add(&mut doc, hidden_group, "button", &[]);
        let inert_group = add(&mut doc, c, "div", &[("inert", "")]);
        add(&mut doc, inert_group, "button", &[]);
        let none_group = add(&mut doc, c, "div", &[]);
        doc.set_display(none_group, Display::None).unwrap();
        add(&mut doc, none_group, "button", &[]);
        let invisible = add(&mut doc, c, "button", &[]);
        doc.set_visibility(invisible, Visibility::Hidden).unwrap();
        let collapsed = add(&mut doc, c, "button", &[]);
        doc.set_bounds(collapsed, Rect::default()).unwrap();

        assert_eq!(tabbable(&doc, c), vec![ok]);
    }

    #[test]
    fn test_zero_size_parent_does_not_hide_children() {
        let mut doc = Document::new();
        let c = container(&mut doc);
        let wrapper = add(&mut doc, c, "span", &[("tabindex", "0")]);
        doc.set_bounds(wrapper, Rect::default()).unwrap();
        let inner = add(&mut doc, wrapper, "button", &[]);
        assert_eq!(tabbable(&doc, c), vec![inner]);
    }

    #[test]
    fn test_disabled_fieldset() {
        let mut doc = Document::new();
        let c = container(&mut doc);
        let fieldset = add(&mut doc, c, "fieldset", &[("disabled", "")]);
        let legend = add(&mut doc, fieldset, "legend", &[]);
        let in_legend = add(&mut doc, legend, "input", &[]);
        add(&mut doc, fieldset, "input", &[]);
        let custom = add(&mut doc, fieldset, "div", &[("tabindex", "0")]);

        assert_eq!(tabbable(&doc, c), vec![in_legend, custom]);
        // Query rooted inside the fieldset still sees the ancestor
        let inner = add(&mut doc, fieldset, "div", &[]);
        add(&mut doc, inner, "button", &[]);
        assert!(tabbable(&doc, inner).is_empty());
    }

    #[test]
    fn test_hidden_ancestor_of_container() {
        let mut doc = Document::new();
        let outer = container(&mut doc);
        let c = add(&mut doc, outer, "div", &[]);
        add(&mut doc, c, "button", &[]);
        doc.set_attribute(outer, "hidden", "").unwrap();
        assert!(tabbable(&doc, c).is_empty());
    }

    #[test]
    fn test_focusable_admits_negative_tabindex() {
        let mut doc = Document::new();
        let c = container(&mut doc);
        let a = add(&mut doc, c, "button", &[("tabindex", "-1")]);
        let b = add(&mut doc, c, "button", &[]);
        assert_eq!(tabbable(&doc, c), vec![b]);
        assert_eq!(focusable(&doc, c), vec![a, b]);
    }

    #[test]
    fn test_empty_and_detached_containers() {
        let mut doc = Document::new();
        let c = container(&mut doc);
        assert!(tabbable(&doc, c).is_empty());
        assert_eq!(first_tabbable(&doc, c), None);

        let detached = doc.create_element("div");
        let b = doc.create_element("button");
        doc.append_child(detached, b).unwrap();
        assert!(tabbable(&doc, detached).is_empty());
        assert!(!is_tabbable(&doc, detached, b));
    }

    #[derive(Debug, Clone, Copy)]
    enum Kind {
        Button,
        Disabled,
        Hidden,
        Plain,
        Negative,
    }

    fn kind() -> impl Strategy<Value = Kind> {
        prop_oneof![
            Just(Kind::Button),
            Just(Kind::Disabled),
            Just(Kind::Hidden),
            Just(Kind::Plain),
            Just(Kind::Negative),
        ]
    }

    proptest! {
        #[test]
        fn prop_query_returns_exactly_qualifying_in_order(kinds in prop::collection::vec(kind(), 0..24)) {
            let mut doc = Document::new();
            let c = container(&mut doc);
            let mut expected = Vec::new();
            for k in kinds {
                let n = match k {
                    Kind::Button => add(&mut doc, c, "button", &[]),
                    Kind::Disabled => add(&mut doc, c, "button", &[("disabled", "")]),
                    Kind::Hidden => add(&mut doc, c, "button", &[("hidden", "")]),
                    Kind::Plain => add(&mut doc, c, "span", &[]),
                    Kind::Negative => add(&mut doc, c, "button", &[("tabindex", "-1")]),
                };
                if matches!(k, Kind::Button) {
                    expected.push(n);
                }
            }
            prop_assert_eq!(tabbable(&doc, c), expected);
        }
    }
}
