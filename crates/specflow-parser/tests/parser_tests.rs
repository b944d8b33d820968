use pretty_assertions::assert_eq;
use proptest::prelude::*;
use specflow_gateway::{GatewayError, SharedGateway};
use specflow_parser::{
    parse_structured_document, parse_structured_document_with_preprocessing, DocumentParser,
    ParseRule,
};
use specflow_test_utils::{test_model, ScriptedGateway};
use std::collections::HashSet;
use std::sync::Arc;

proptest! {
    #[test]
    fn prop_parse_is_deterministic(text in "[a-zA-Z0-9 #:*\\-\\[\\]\n]{0,300}") {
        let first = parse_structured_document(&text);
        let second = parse_structured_document(&text);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_ids_are_unique(text in "[A-Za-z0-9 #:\\-\n]{1,300}") {
        if let Ok(reqs) = parse_structured_document(&text) {
            let ids: HashSet<&str> = reqs.iter().map(|r| r.id.as_str()).collect();
            prop_assert_eq!(ids.len(), reqs.len());
        }
    }

    #[test]
    fn prop_delimited_blocks_map_one_to_one(
        blocks in proptest::collection::vec("[a-z]{1,8}( [a-z]{1,8}){0,4}", 2..12)
    ) {
        let text = blocks.join("\n---\n");
        let reqs = parse_structured_document(&text).unwrap();
        prop_assert_eq!(reqs.len(), blocks.len());
        for (req, block) in reqs.iter().zip(&blocks) {
            prop_assert_eq!(&req.description, block);
        }
    }
}

#[test]
fn three_delimited_blocks_in_order() {
    let reqs = parse_structured_document("A1\n---\nA2\n---\nA3").unwrap();
    let names: Vec<&str> = reqs.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["A1", "A2", "A3"]);
}

#[test]
fn mixed_document_with_sections() {
    let text = "\
# Billing Service

Some background on why billing matters.

## User Stories

- US-1: As a customer I can view invoices
- US-2: As an admin I can issue refunds
  - partial refunds
  - full refunds

## Non-Functional Requirements

1. [NFR-1] p99 latency under 300ms
2. Data retained for seven years

## Open Questions

- Which currency first?
";
    let doc = DocumentParser::new().parse_detailed(text).unwrap();
    assert_eq!(doc.rule, ParseRule::Sections);
    let ids: Vec<&str> = doc.requirements.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["US-1", "US-2", "NFR-1", "REQ-4"]);
    assert_eq!(
        doc.requirements[1].description,
        "As an admin I can issue refunds\n- partial refunds\n- full refunds"
    );
    assert_eq!(
        doc.requirements[3].section.as_deref(),
        Some("Non-Functional Requirements")
    );
}

fn long_delimited(blocks: usize) -> String {
    (0..blocks)
        .map(|i| format!("Requirement number {i} with enough words to pad the document out. {}", "x".repeat(40)))
        .collect::<Vec<_>>()
        .join("\n---\n")
}

#[tokio::test]
async fn preprocessing_never_loses_requirements_on_long_input() {
    let text = long_delimited(8);
    assert!(text.chars().count() > 500);

    let gateway: SharedGateway = Arc::new(ScriptedGateway::new().reply("Rewrite", "one\n---\ntwo"));
    let reqs = parse_structured_document_with_preprocessing(&text, gateway, test_model())
        .await
        .unwrap();
    assert_eq!(reqs.len(), 8);
}

#[tokio::test]
async fn preprocessing_failure_falls_back() {
    let scripted = Arc::new(
        ScriptedGateway::new().fail("Rewrite", GatewayError::Unavailable("offline".into())),
    );
    let gateway: SharedGateway = scripted.clone();
    let reqs = parse_structured_document_with_preprocessing("A\n---\nB", gateway, test_model())
        .await
        .unwrap();
    assert_eq!(reqs.len(), 2);
    assert_eq!(scripted.call_count(), 1);
}

#[tokio::test]
async fn preprocessing_prompt_carries_the_document() {
    let scripted = Arc::new(ScriptedGateway::new().reply("Rewrite", "P1\n---\nP2\n---\nP3"));
    let gateway: SharedGateway = scripted.clone();
    let reqs = parse_structured_document_with_preprocessing("short doc body", gateway, test_model())
        .await
        .unwrap();
    assert_eq!(reqs.len(), 3);
    assert!(scripted.prompts()[0].contains("short doc body"));
}
