//! End-to-end resolution scenarios against an in-memory session.

use std::sync::Arc;
use std::thread;

use action_locator::{
    classify, DomNode, DomSnapshot, ElementHandle, FailureCategory, FuzzyMatcher,
    InMemoryLocatorHistory, Locator, LocatorHistory, ResolveError, ResolveStage,
    SelfHealingResolver, SessionCall, SessionError, SnapshotSession, StrategyChain,
};

fn login_page() -> DomSnapshot {
    DomSnapshot::new(
        DomNode::new("html").with_child(
            DomNode::new("body")
                .with_child(
                    DomNode::new("form")
                        .with_attr("id", "login")
                        .with_child(
                            DomNode::new("input")
                                .with_attr("name", "user_name")
                                .with_attr("type", "text"),
                        )
                        .with_child(
                            DomNode::new("button")
                                .with_attr("id", "submit")
                                .with_text("Log in"),
                        ),
                ),
        ),
    )
}

fn dashboard_page() -> DomSnapshot {
    DomSnapshot::new(
        DomNode::new("html").with_child(
            DomNode::new("body")
                .with_child(
                    DomNode::new("h1")
                        .with_attr("id", "page-heading")
                        .with_text("Dashboard"),
                )
                .with_child(DomNode::new("div").with_attr("class", "content")),
        ),
    )
}

fn resolver_for(
    session: &SnapshotSession,
    history: &Arc<InMemoryLocatorHistory>,
) -> SelfHealingResolver<SnapshotSession> {
    SelfHealingResolver::new(session.clone(), history.clone())
}

fn not_found(what: &str) -> SessionError {
    SessionError::NotFound(format!("Unable to locate element: {}", what))
}

#[test]
fn heuristic_rewrite_heals_id_locator() {
    let session = SnapshotSession::new(login_page());
    session.fail_with(Locator::id("submit"), not_found("submit"));
    let history = Arc::new(InMemoryLocatorHistory::new());
    let resolver = resolver_for(&session, &history);

    let resolution = resolver
        .resolve("Submit Button", &Locator::id("submit"))
        .unwrap();

    assert_eq!(resolution.stage, ResolveStage::Heuristic);
    assert_eq!(resolution.locator, Locator::xpath("//*[@id='submit']"));
    assert_eq!(resolution.element.tag_name(), "button");
    assert_eq!(
        history.lookup("Submit Button"),
        Some(Locator::xpath("//*[@id='submit']"))
    );
    assert_eq!(
        session.find_calls(),
        vec![Locator::id("submit"), Locator::xpath("//*[@id='submit']")]
    );
}

#[test]
fn history_entry_heals_and_stays_unchanged() {
    let session = SnapshotSession::new(login_page());
    let history = Arc::new(InMemoryLocatorHistory::with_entries([(
        "Login Field",
        Locator::name("user_name"),
    )]));
    let resolver = resolver_for(&session, &history);

    let resolution = resolver
        .resolve("Login Field", &Locator::id("old_id"))
        .unwrap();

    assert_eq!(resolution.stage, ResolveStage::History);
    assert_eq!(resolution.locator, Locator::name("user_name"));
    assert_eq!(resolution.element.tag_name(), "input");
    assert_eq!(history.lookup("Login Field"), Some(Locator::name("user_name")));
    assert_eq!(history.len(), 1);
}

#[test]
fn history_precedes_heuristics() {
    let session = SnapshotSession::new(login_page());
    session.fail_with(Locator::id("submit"), not_found("submit"));
    let history = Arc::new(InMemoryLocatorHistory::with_entries([(
        "Submit Button",
        Locator::css("button#submit"),
    )]));
    let resolver = resolver_for(&session, &history);

    let resolution = resolver
        .resolve("Submit Button", &Locator::id("submit"))
        .unwrap();

    assert_eq!(resolution.stage, ResolveStage::History);
    assert_eq!(resolution.locator, Locator::css("button#submit"));
    // the xpath rewrite would also have worked but is never tried
    assert_eq!(
        session.find_calls(),
        vec![Locator::id("submit"), Locator::css("button#submit")]
    );
}

#[test]
fn successful_locator_is_recorded_idempotently() {
    let session = SnapshotSession::new(login_page());
    let history = Arc::new(InMemoryLocatorHistory::new());
    let resolver = resolver_for(&session, &history);

    resolver
        .resolve("Submit Button", &Locator::id("submit"))
        .unwrap();
    let first = history.entries();
    resolver
        .resolve("Submit Button", &Locator::id("submit"))
        .unwrap();

    assert_eq!(history.entries(), first);
    assert_eq!(history.lookup("Submit Button"), Some(Locator::id("submit")));
}

#[test]
fn primary_success_replaces_stale_history() {
    let session = SnapshotSession::new(login_page());
    let history = Arc::new(InMemoryLocatorHistory::with_entries([(
        "Submit Button",
        Locator::css("#old-submit"),
    )]));
    let resolver = resolver_for(&session, &history);

    let resolution = resolver
        .resolve("Submit Button", &Locator::id("submit"))
        .unwrap();

    assert_eq!(resolution.stage, ResolveStage::Primary);
    assert_eq!(history.lookup("Submit Button"), Some(Locator::id("submit")));
}

#[test]
fn exhaustion_without_candidates_lists_only_primary() {
    let session = SnapshotSession::new(login_page());
    let history = Arc::new(InMemoryLocatorHistory::new());
    let resolver = resolver_for(&session, &history)
        .with_matcher(FuzzyMatcher::new(|_: &str, _: &str| 0u8));

    let err = resolver
        .resolve("Banner", &Locator::xpath("//marquee"))
        .unwrap_err();

    match &err {
        ResolveError::ElementNotFound { element, attempted } => {
            assert_eq!(element, "Banner");
            assert_eq!(attempted, &vec![Locator::xpath("//marquee")]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.category(), FailureCategory::ElementNotFound);
    assert!(history.is_empty());
}

#[test]
fn exhaustion_on_empty_document_lists_only_primary() {
    let session = SnapshotSession::new(DomSnapshot::empty());
    let history = Arc::new(InMemoryLocatorHistory::new());
    let resolver = resolver_for(&session, &history);

    let err = resolver
        .resolve("Anything", &Locator::css(".missing"))
        .unwrap_err();

    assert_eq!(err.attempted(), &[Locator::css(".missing")]);
}

#[test]
fn session_failure_at_primary_skips_every_other_stage() {
    let session = SnapshotSession::new(login_page());
    session.fail_with(
        Locator::id("submit"),
        SessionError::Timeout("find_element exceeded 30s".into()),
    );
    let history = Arc::new(InMemoryLocatorHistory::with_entries([(
        "Submit Button",
        Locator::css("button#submit"),
    )]));
    let resolver = resolver_for(&session, &history);

    let err = resolver
        .resolve("Submit Button", &Locator::id("submit"))
        .unwrap_err();

    assert_eq!(
        err,
        ResolveError::Session(SessionError::Timeout("find_element exceeded 30s".into()))
    );
    assert_eq!(classify(&err), FailureCategory::TimeoutError);
    assert_eq!(
        session.calls(),
        vec![SessionCall::Find(Locator::id("submit"))]
    );
    assert_eq!(
        history.lookup("Submit Button"),
        Some(Locator::css("button#submit"))
    );
}

#[test]
fn session_failure_mid_chain_propagates() {
    let session = SnapshotSession::new(login_page());
    session.fail_with(
        Locator::xpath("//*[@id='gone']"),
        SessionError::Connection("connection reset by peer".into()),
    );
    let history = Arc::new(InMemoryLocatorHistory::new());
    let resolver = resolver_for(&session, &history);

    let err = resolver
        .resolve("Gone", &Locator::id("gone"))
        .unwrap_err();

    assert_eq!(err.category(), FailureCategory::NetworkIssue);
    assert!(!session.calls().contains(&SessionCall::CurrentDocument));
}

#[test]
fn fuzzy_match_heals_with_tag_locator() {
    let session = SnapshotSession::new(dashboard_page());
    let history = Arc::new(InMemoryLocatorHistory::with_entries([(
        "Page Heading",
        Locator::name("heading"),
    )]));
    let resolver = resolver_for(&session, &history);

    let resolution = resolver
        .resolve("Page Heading", &Locator::id("page-heading-v2"))
        .unwrap();

    assert_eq!(resolution.stage, ResolveStage::Fuzzy);
    assert_eq!(resolution.locator, Locator::xpath("//h1"));
    assert!(resolution.fuzzy_score.unwrap() >= 50);
    assert_eq!(history.lookup("Page Heading"), Some(Locator::xpath("//h1")));
}

#[test]
fn fuzzy_failure_lists_all_four_attempts() {
    let session = SnapshotSession::new(dashboard_page());
    session.fail_with(Locator::xpath("//h1"), not_found("//h1"));
    let history = Arc::new(InMemoryLocatorHistory::with_entries([(
        "Page Heading",
        Locator::name("heading"),
    )]));
    let resolver = resolver_for(&session, &history);

    let err = resolver
        .resolve("Page Heading", &Locator::id("page-heading-v2"))
        .unwrap_err();

    assert_eq!(
        err.attempted(),
        &[
            Locator::id("page-heading-v2"),
            Locator::name("heading"),
            Locator::xpath("//*[@id='page-heading-v2']"),
            Locator::xpath("//h1"),
        ]
    );
    assert_eq!(history.lookup("Page Heading"), Some(Locator::name("heading")));
}

#[test]
fn fuzzy_stage_reads_a_fresh_document() {
    let session = SnapshotSession::new(login_page());
    let history = Arc::new(InMemoryLocatorHistory::new());
    let resolver = resolver_for(&session, &history).with_chain(StrategyChain::empty());

    session.replace_document(dashboard_page());
    let resolution = resolver
        .resolve("Page Heading", &Locator::id("page-heading-v2"))
        .unwrap();

    assert_eq!(resolution.element.tag_name(), "h1");
}

#[test]
fn fuzzy_tie_resolves_to_first_node_in_document_order() {
    let session = SnapshotSession::new(dashboard_page());
    let history = Arc::new(InMemoryLocatorHistory::new());
    let resolver = resolver_for(&session, &history)
        .with_chain(StrategyChain::empty())
        .with_matcher(FuzzyMatcher::new(|markup: &str, _: &str| {
            if markup.starts_with("<h1") || markup.starts_with("<div") {
                70u8
            } else {
                10u8
            }
        }));

    let resolution = resolver
        .resolve("Heading", &Locator::css("#nope"))
        .unwrap();

    assert_eq!(resolution.locator, Locator::xpath("//h1"));
    assert_eq!(resolution.fuzzy_score, Some(70));
}

#[test]
fn shared_history_across_threads() {
    let history = Arc::new(InMemoryLocatorHistory::new());
    let handles = (0..4)
        .map(|i| {
            let history: Arc<dyn LocatorHistory> = history.clone();
            thread::spawn(move || {
                let session = SnapshotSession::new(login_page());
                let resolver = SelfHealingResolver::new(session, history);
                resolver
                    .resolve(&format!("Submit {}", i), &Locator::id("submit"))
                    .map(|r| r.stage)
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), ResolveStage::Primary);
    }
    assert_eq!(history.len(), 4);
}

#[test]
fn resolved_element_accepts_input() {
    let session = SnapshotSession::new(login_page());
    let history = Arc::new(InMemoryLocatorHistory::new());
    let resolver = resolver_for(&session, &history);

    let element = resolver
        .resolve("Login Field", &Locator::name("user_name"))
        .unwrap()
        .into_element();
    element.send_keys("Testing Self-Healing Agent").unwrap();

    assert_eq!(element.typed_text(), "Testing Self-Healing Agent");
}

#[test]
fn id_with_both_quote_kinds_heals_through_concat_rewrite() {
    let weird = "a'b\"c";
    let session = SnapshotSession::new(DomSnapshot::new(
        DomNode::new("body").with_child(DomNode::new("span").with_attr("id", weird)),
    ));
    session.fail_with(Locator::id(weird), not_found(weird));
    let history = Arc::new(InMemoryLocatorHistory::new());
    let resolver = resolver_for(&session, &history);

    let resolution = resolver.resolve("Weird", &Locator::id(weird)).unwrap();

    assert_eq!(resolution.stage, ResolveStage::Heuristic);
    assert_eq!(
        resolution.locator,
        Locator::xpath("//*[@id=concat('a', \"'\", 'b\"c')]")
    );
    assert_eq!(resolution.element.tag_name(), "span");
}

#[test]
fn missing_id_with_both_quote_kinds_still_reaches_fuzzy() {
    let session = SnapshotSession::new(login_page());
    let history = Arc::new(InMemoryLocatorHistory::new());
    let resolver = resolver_for(&session, &history);

    let result = resolver.resolve("Weird", &Locator::id("a'b\"c"));

    assert!(!matches!(result, Err(ResolveError::Session(_))));
    assert!(session.calls().contains(&SessionCall::CurrentDocument));
    assert_eq!(
        session.find_calls()[1],
        Locator::xpath("//*[@id=concat('a', \"'\", 'b\"c')]")
    );
}

#[test]
fn fuzzy_heal_on_namespaced_tag() {
    let session = SnapshotSession::new(DomSnapshot::new(
        DomNode::new("svg:rect").with_attr("id", "chart-bar"),
    ));
    let history = Arc::new(InMemoryLocatorHistory::new());
    let resolver = resolver_for(&session, &history);

    let resolution = resolver
        .resolve("Chart Bars", &Locator::css("#chart-bars"))
        .unwrap();

    assert_eq!(resolution.stage, ResolveStage::Fuzzy);
    assert_eq!(resolution.locator, Locator::xpath("//svg:rect"));
    assert_eq!(resolution.element.tag_name(), "svg:rect");
}

