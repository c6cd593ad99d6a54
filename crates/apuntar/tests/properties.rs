//! Property suites: every emitted candidate must resolve to exactly the
//! target, generation is total and deterministic, and ranking is ordered.

use apuntar::text::{is_unique_by_text, is_unique_by_text_in};
use apuntar::{AddressKind, Candidate, CategorizedCandidates, Session};
use apuntar_dom::{el, query_css, query_xpath, Document, DocumentBuilder, ElementBuilder, NodeId};
use proptest::prelude::*;

const PANEL_TAGS: &[&str] = &["div", "section", "ul"];
const LEAF_TAGS: &[&str] = &["span", "button", "a", "li"];
const CLASSES: &[&str] = &["card", "row", "active", "primary"];
const TEXTS: &[&str] = &["Alpha", "Beta", "Save", "OK"];

#[derive(Debug, Clone)]
struct LeafSpec {
    tag: usize,
    class: Option<usize>,
    text: Option<usize>,
    test_attr: bool,
}

#[derive(Debug, Clone)]
struct PanelSpec {
    tag: usize,
    id: bool,
    class: Option<usize>,
    leaves: Vec<LeafSpec>,
}

fn arb_leaf() -> impl Strategy<Value = LeafSpec> {
    (
        0..LEAF_TAGS.len(),
        proptest::option::of(0..CLASSES.len()),
        proptest::option::of(0..TEXTS.len()),
        any::<bool>(),
    )
        .prop_map(|(tag, class, text, test_attr)| LeafSpec { tag, class, text, test_attr })
}

fn arb_panel() -> impl Strategy<Value = PanelSpec> {
    (
        0..PANEL_TAGS.len(),
        any::<bool>(),
        proptest::option::of(0..CLASSES.len()),
        proptest::collection::vec(arb_leaf(), 0..5),
    )
        .prop_map(|(tag, id, class, leaves)| PanelSpec { tag, id, class, leaves })
}

fn build_doc(panels: &[PanelSpec]) -> Document {
    let mut builder = DocumentBuilder::new();
    for (pi, panel) in panels.iter().enumerate() {
        let mut element: ElementBuilder = el(PANEL_TAGS[panel.tag]);
        if panel.id {
            element = element.id(&format!("panel-{pi}"));
        }
        if let Some(c) = panel.class {
            element = element.class(CLASSES[c]);
        }
        for (li, leaf) in panel.leaves.iter().enumerate() {
            let mut child = el(LEAF_TAGS[leaf.tag]);
            if let Some(c) = leaf.class {
                child = child.class(CLASSES[c]);
            }
            if let Some(t) = leaf.text {
                child = child.text(TEXTS[t]);
            }
            if leaf.test_attr {
                child = child.attr("data-testid", &format!("leaf-{pi}-{li}"));
            }
            element = element.child(child);
        }
        builder = builder.body_child(element);
    }
    builder.build()
}

fn resolves_to_target(doc: &Document, candidate: &Candidate) -> bool {
    match candidate.kind {
        AddressKind::Css | AddressKind::Positional => {
            query_css(doc, &candidate.address.selector)
                .map(|m| m == [candidate.target])
                .unwrap_or(false)
        }
        AddressKind::XPath => query_xpath(doc, &candidate.address.selector)
            .map(|m| m == [candidate.target])
            .unwrap_or(false),
        AddressKind::Text => {
            let Some(c) = candidate.address.constraints.as_ref() else {
                return false;
            };
            match &c.scope {
                Some(scope) => {
                    let Ok(nodes) = query_css(doc, scope) else {
                        return false;
                    };
                    nodes.len() == 1
                        && is_unique_by_text_in(doc, candidate.target, &c.text, nodes[0])
                }
                None => is_unique_by_text(doc, candidate.target, &c.text, c.tag.as_deref()),
            }
        }
    }
}

fn all_targets(doc: &Document) -> Vec<NodeId> {
    doc.all_elements()
        .into_iter()
        .filter(|id| {
            doc.element(*id)
                .is_some_and(|e| e.tag != "html" && e.tag != "head")
        })
        .collect()
}

fn assert_bucket_ordered(bucket: &[Candidate]) {
    for window in bucket.windows(2) {
        assert!(
            window[0].score > window[1].score
                || (window[0].score == window[1].score
                    && window[0].rendered.len() <= window[1].rendered.len()),
            "{} ({}) before {} ({})",
            window[0].rendered,
            window[0].score,
            window[1].rendered,
            window[1].score
        );
    }
}

fn buckets_of(buckets: &CategorizedCandidates) -> [&[Candidate]; 6] {
    [
        &buckets.basic,
        &buckets.more_basic,
        &buckets.text,
        &buckets.positional,
        &buckets.xpath,
        &buckets.aggressive,
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_candidate_resolves_to_its_target(
        panels in proptest::collection::vec(arb_panel(), 1..5),
        pick in any::<prop::sample::Index>(),
    ) {
        let doc = build_doc(&panels);
        let targets = all_targets(&doc);
        let raw = targets[pick.index(targets.len())];

        let mut session = Session::default();
        let buckets = session.generate(&doc, raw).unwrap();
        for candidate in buckets.iter() {
            prop_assert!(
                resolves_to_target(&doc, candidate),
                "{} does not resolve to its target",
                candidate.rendered
            );
        }
    }

    #[test]
    fn generation_is_total(
        panels in proptest::collection::vec(arb_panel(), 1..5),
        pick in any::<prop::sample::Index>(),
    ) {
        let doc = build_doc(&panels);
        let targets = all_targets(&doc);
        let raw = targets[pick.index(targets.len())];

        let mut session = Session::default();
        let buckets = session.generate(&doc, raw).unwrap();
        prop_assert!(!buckets.is_empty());
    }

    #[test]
    fn buckets_are_rank_ordered(
        panels in proptest::collection::vec(arb_panel(), 1..5),
        pick in any::<prop::sample::Index>(),
    ) {
        let doc = build_doc(&panels);
        let targets = all_targets(&doc);
        let raw = targets[pick.index(targets.len())];

        let mut session = Session::default();
        let buckets = session.generate(&doc, raw).unwrap();
        for bucket in buckets_of(&buckets) {
            assert_bucket_ordered(bucket);
        }
    }

    #[test]
    fn generation_is_idempotent(
        panels in proptest::collection::vec(arb_panel(), 1..5),
        pick in any::<prop::sample::Index>(),
    ) {
        let doc = build_doc(&panels);
        let targets = all_targets(&doc);
        let raw = targets[pick.index(targets.len())];

        let mut first_session = Session::default();
        let mut second_session = Session::default();
        let first: Vec<(String, i32)> = first_session
            .generate(&doc, raw)
            .unwrap()
            .iter()
            .map(|c| (c.rendered.clone(), c.score))
            .collect();
        let second: Vec<(String, i32)> = second_session
            .generate(&doc, raw)
            .unwrap()
            .iter()
            .map(|c| (c.rendered.clone(), c.score))
            .collect();
        prop_assert_eq!(first, second);
    }
}

#[test]
fn digit_bearing_id_never_matches_digit_free_score() {
    let with_digits = DocumentBuilder::new()
        .body_child(el("button").id("save-48291"))
        .build();
    let digit_free = DocumentBuilder::new()
        .body_child(el("button").id("save-btn"))
        .build();

    let mut session = Session::default();
    let digit_best = session
        .generate(&with_digits, with_digits.all_elements().into_iter().last().unwrap())
        .unwrap()
        .best()
        .unwrap()
        .score;
    let clean_best = session
        .generate(&digit_free, digit_free.all_elements().into_iter().last().unwrap())
        .unwrap()
        .best()
        .unwrap()
        .score;
    assert!(clean_best > digit_best, "{clean_best} vs {digit_best}");
}
