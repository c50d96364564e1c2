//! Browser session port and an in-memory implementation over a snapshot

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::errors::SessionError;
use crate::snapshot::{is_name_token, DomNode, DomSnapshot};
use crate::types::{Locator, LocatorStrategy};

/// Element reference handed back by a session
pub trait ElementHandle {
    /// Lowercase tag name
    fn tag_name(&self) -> String;

    /// Simulate typing into the element
    fn send_keys(&self, text: &str) -> Result<(), SessionError>;
}

/// Browser session collaborator
///
/// `find` reports a missing element as [`SessionError::NotFound`]; any other
/// error means the session itself is in trouble.
pub trait BrowserSession {
    type Element: ElementHandle;

    fn find(&self, locator: &Locator) -> Result<Self::Element, SessionError>;

    /// Fresh, read-only capture of the current document
    fn current_document(&self) -> Result<DomSnapshot, SessionError>;
}

impl<S: BrowserSession + ?Sized> BrowserSession for &S {
    type Element = S::Element;

    fn find(&self, locator: &Locator) -> Result<Self::Element, SessionError> {
        (**self).find(locator)
    }

    fn current_document(&self) -> Result<DomSnapshot, SessionError> {
        (**self).current_document()
    }
}

impl<S: BrowserSession + ?Sized> BrowserSession for Arc<S> {
    type Element = S::Element;

    fn find(&self, locator: &Locator) -> Result<Self::Element, SessionError> {
        (**self).find(locator)
    }

    fn current_document(&self) -> Result<DomSnapshot, SessionError> {
        (**self).current_document()
    }
}

/// Call made against a [`SnapshotSession`], for assertions in tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
    Find(Locator),
    CurrentDocument,
}

/// Element of a [`SnapshotSession`]
#[derive(Debug, Clone)]
pub struct SnapshotElement {
    tag: String,
    index: usize,
    attributes: Vec<(String, String)>,
    typed: Arc<Mutex<String>>,
}

impl SnapshotElement {
    /// Position in document order
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Text sent with [`ElementHandle::send_keys`] so far
    pub fn typed_text(&self) -> String {
        self.typed.lock().clone()
    }
}

impl ElementHandle for SnapshotElement {
    fn tag_name(&self) -> String {
        self.tag.clone()
    }

    fn send_keys(&self, text: &str) -> Result<(), SessionError> {
        self.typed.lock().push_str(text);
        Ok(())
    }
}

/// In-memory session that evaluates locators against a recorded document.
///
/// Supports the simple locator forms recorded scripts use:
/// `#id`, `.class`, `tag`, `tag#id`, `tag.class`, `[attr='v']` for CSS and
/// `//tag`, `//*`, `//tag[@attr='v']`, `//*[contains(@attr,'v')]` for XPath.
/// The first match in document order wins.
#[derive(Debug, Clone)]
pub struct SnapshotSession {
    document: Arc<Mutex<DomSnapshot>>,
    failures: Arc<Mutex<Vec<(Locator, SessionError)>>>,
    document_failure: Arc<Mutex<Option<SessionError>>>,
    calls: Arc<Mutex<Vec<SessionCall>>>,
}

impl SnapshotSession {
    pub fn new(document: DomSnapshot) -> Self {
        Self {
            document: Arc::new(Mutex::new(document)),
            failures: Arc::new(Mutex::new(Vec::new())),
            document_failure: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Swap the document, as a navigation or re-render would
    pub fn replace_document(&self, document: DomSnapshot) {
        *self.document.lock() = document;
    }

    /// Make `find(locator)` fail with `error` instead of evaluating it
    pub fn fail_with(&self, locator: Locator, error: SessionError) {
        self.failures.lock().push((locator, error));
    }

    /// Make `current_document` fail with `error`
    pub fn fail_document_with(&self, error: SessionError) {
        *self.document_failure.lock() = Some(error);
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<SessionCall> {
        self.calls.lock().clone()
    }

    /// Locators passed to `find`, in order
    pub fn find_calls(&self) -> Vec<Locator> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                SessionCall::Find(locator) => Some(locator.clone()),
                SessionCall::CurrentDocument => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }
}

impl BrowserSession for SnapshotSession {
    type Element = SnapshotElement;

    fn find(&self, locator: &Locator) -> Result<SnapshotElement, SessionError> {
        self.calls.lock().push(SessionCall::Find(locator.clone()));
        if let Some((_, error)) = self
            .failures
            .lock()
            .iter()
            .find(|(failing, _)| failing == locator)
        {
            return Err(error.clone());
        }

        let selector = Selector::compile(locator)?;
        let document = self.document.lock();
        let found = document
            .elements()
            .enumerate()
            .find(|(_, node)| selector.matches(node));
        match found {
            Some((index, node)) => {
                trace!(locator = %locator, index, "snapshot match");
                Ok(SnapshotElement {
                    tag: node.tag.to_ascii_lowercase(),
                    index,
                    attributes: node
                        .attributes
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                    typed: Arc::new(Mutex::new(String::new())),
                })
            }
            None => Err(SessionError::NotFound(format!(
                "Unable to locate element: {}",
                locator
            ))),
        }
    }

    fn current_document(&self) -> Result<DomSnapshot, SessionError> {
        self.calls.lock().push(SessionCall::CurrentDocument);
        if let Some(error) = self.document_failure.lock().clone() {
            return Err(error);
        }
        Ok(self.document.lock().clone())
    }
}

/// Compiled predicate for one locator
#[derive(Debug, Clone, PartialEq, Eq)]
enum Selector {
    Attr {
        tag: Option<String>,
        name: String,
        value: String,
    },
    AttrContains {
        tag: Option<String>,
        name: String,
        value: String,
    },
    Class {
        tag: Option<String>,
        class: String,
    },
    Tag(Option<String>),
    LinkText {
        text: String,
        partial: bool,
    },
}

impl Selector {
    fn compile(locator: &Locator) -> Result<Self, SessionError> {
        let query = locator.query().trim();
        let selector = match locator.strategy() {
            LocatorStrategy::Id => Selector::attr(None, "id", query),
            LocatorStrategy::Name => Selector::attr(None, "name", query),
            LocatorStrategy::ClassName => Selector::Class {
                tag: None,
                class: query.to_string(),
            },
            LocatorStrategy::TagName => Selector::Tag(tag_filter(query)),
            LocatorStrategy::LinkText => Selector::LinkText {
                text: query.to_string(),
                partial: false,
            },
            LocatorStrategy::PartialLinkText => Selector::LinkText {
                text: query.to_string(),
                partial: true,
            },
            LocatorStrategy::Css => compile_css(query)?,
            LocatorStrategy::XPath => compile_xpath(query)?,
        };
        Ok(selector)
    }

    fn attr(tag: Option<String>, name: &str, value: &str) -> Self {
        Selector::Attr {
            tag,
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    fn matches(&self, node: &DomNode) -> bool {
        match self {
            Selector::Attr { tag, name, value } => {
                tag_matches(tag, node) && node.attr(name) == Some(value.as_str())
            }
            Selector::AttrContains { tag, name, value } => {
                tag_matches(tag, node)
                    && node.attr(name).map_or(false, |actual| actual.contains(value.as_str()))
            }
            Selector::Class { tag, class } => {
                tag_matches(tag, node) && node.classes().any(|c| c == class)
            }
            Selector::Tag(tag) => tag_matches(tag, node),
            Selector::LinkText { text, partial } => {
                if !node.tag.eq_ignore_ascii_case("a") {
                    return false;
                }
                let content = node.text_content();
                let content = content.trim();
                if *partial {
                    content.contains(text.as_str())
                } else {
                    content == text
                }
            }
        }
    }
}

fn tag_filter(tag: &str) -> Option<String> {
    match tag {
        "" | "*" => None,
        other => Some(other.to_ascii_lowercase()),
    }
}

fn tag_matches(tag: &Option<String>, node: &DomNode) -> bool {
    tag.as_ref()
        .map_or(true, |expected| node.tag.eq_ignore_ascii_case(expected))
}

fn unsupported(kind: &str, query: &str) -> SessionError {
    SessionError::Other(format!("unsupported {} expression: {}", kind, query))
}

fn is_ident(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn strip_quotes(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    let quoted = (raw.starts_with('\'') && raw.ends_with('\''))
        || (raw.starts_with('"') && raw.ends_with('"'));
    if quoted && raw.len() >= 2 {
        Some(&raw[1..raw.len() - 1])
    } else {
        None
    }
}

/// XPath string literal or a `concat()` of literals, as built by
/// [`xpath_literal`](crate::strategies::xpath_literal).
fn xpath_string(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let Some(args) = raw
        .strip_prefix("concat(")
        .and_then(|rest| rest.strip_suffix(')'))
    else {
        return strip_quotes(raw).map(str::to_string);
    };

    let mut out = String::new();
    let mut rest = args.trim_start();
    loop {
        let quote = rest.chars().next()?;
        if quote != '\'' && quote != '"' {
            return None;
        }
        let end = rest[1..].find(quote)? + 1;
        out.push_str(&rest[1..end]);
        rest = rest[end + 1..].trim_start();
        match rest.strip_prefix(',') {
            Some(next) => rest = next.trim_start(),
            None if rest.is_empty() => return Some(out),
            None => return None,
        }
    }
}

fn compile_css(query: &str) -> Result<Selector, SessionError> {
    // tag[attr='v'] / [attr='v']
    if let Some(open) = query.find('[') {
        let tag = &query[..open];
        let inner = query[open..]
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| unsupported("css", query))?;
        let (name, raw_value) = inner.split_once('=').ok_or_else(|| unsupported("css", query))?;
        let value = strip_quotes(raw_value)
            .map(str::to_string)
            .unwrap_or_else(|| raw_value.trim().to_string());
        if !(tag.is_empty() || is_ident(tag)) || !is_ident(name.trim()) {
            return Err(unsupported("css", query));
        }
        return Ok(Selector::attr(tag_filter(tag), name.trim(), &value));
    }
    if let Some((tag, id)) = query.split_once('#') {
        if (tag.is_empty() || is_ident(tag)) && is_ident(id) {
            return Ok(Selector::attr(tag_filter(tag), "id", id));
        }
        return Err(unsupported("css", query));
    }
    if let Some((tag, class)) = query.split_once('.') {
        if (tag.is_empty() || is_ident(tag)) && is_ident(class) {
            return Ok(Selector::Class {
                tag: tag_filter(tag),
                class: class.to_string(),
            });
        }
        return Err(unsupported("css", query));
    }
    if query == "*" || is_ident(query) {
        return Ok(Selector::Tag(tag_filter(query)));
    }
    Err(unsupported("css", query))
}

fn compile_xpath(query: &str) -> Result<Selector, SessionError> {
    let body = query
        .strip_prefix("//")
        .ok_or_else(|| unsupported("xpath", query))?;
    let (tag, predicate) = match body.find('[') {
        Some(open) => {
            let predicate = body[open..]
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
                .ok_or_else(|| unsupported("xpath", query))?;
            (&body[..open], Some(predicate.trim()))
        }
        None => (body, None),
    };
    if !(tag == "*" || is_name_token(tag)) {
        return Err(unsupported("xpath", query));
    }
    let tag = tag_filter(tag);

    let Some(predicate) = predicate else {
        return Ok(Selector::Tag(tag));
    };

    if let Some(args) = predicate
        .strip_prefix("contains(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let (name, raw_value) = args.split_once(',').ok_or_else(|| unsupported("xpath", query))?;
        let name = name
            .trim()
            .strip_prefix('@')
            .ok_or_else(|| unsupported("xpath", query))?;
        let value = xpath_string(raw_value).ok_or_else(|| unsupported("xpath", query))?;
        return Ok(Selector::AttrContains {
            tag,
            name: name.to_string(),
            value,
        });
    }

    let (name, raw_value) = predicate
        .split_once('=')
        .ok_or_else(|| unsupported("xpath", query))?;
    let name = name
        .trim()
        .strip_prefix('@')
        .ok_or_else(|| unsupported("xpath", query))?;
    let value = xpath_string(raw_value).ok_or_else(|| unsupported("xpath", query))?;
    Ok(Selector::attr(tag, name, &value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_page() -> DomSnapshot {
        DomSnapshot::new(
            DomNode::new("html").with_child(
                DomNode::new("body")
                    .with_child(DomNode::new("h1").with_text("Sign in"))
                    .with_child(
                        DomNode::new("form")
                            .with_attr("id", "login")
                            .with_child(
                                DomNode::new("input")
                                    .with_attr("name", "user_name")
                                    .with_attr("class", "field wide"),
                            )
                            .with_child(
                                DomNode::new("button")
                                    .with_attr("id", "submit")
                                    .with_text("Log in"),
                            ),
                    )
                    .with_child(
                        DomNode::new("a")
                            .with_attr("href", "/forgot")
                            .with_text("Forgot password?"),
                    ),
            ),
        )
    }

    fn tag_of(session: &SnapshotSession, locator: Locator) -> String {
        session.find(&locator).unwrap().tag_name()
    }

    #[test]
    fn test_basic_strategies() {
        let session = SnapshotSession::new(login_page());
        assert_eq!(tag_of(&session, Locator::id("submit")), "button");
        assert_eq!(tag_of(&session, Locator::name("user_name")), "input");
        assert_eq!(
            tag_of(&session, Locator::new(LocatorStrategy::ClassName, "wide")),
            "input"
        );
        assert_eq!(
            tag_of(&session, Locator::new(LocatorStrategy::TagName, "h1")),
            "h1"
        );
        assert_eq!(
            tag_of(&session, Locator::new(LocatorStrategy::LinkText, "Forgot password?")),
            "a"
        );
        assert_eq!(
            tag_of(&session, Locator::new(LocatorStrategy::PartialLinkText, "Forgot")),
            "a"
        );
    }

    #[test]
    fn test_css_forms() {
        let session = SnapshotSession::new(login_page());
        assert_eq!(tag_of(&session, Locator::css("#submit")), "button");
        assert_eq!(tag_of(&session, Locator::css("button#submit")), "button");
        assert_eq!(tag_of(&session, Locator::css(".field")), "input");
        assert_eq!(tag_of(&session, Locator::css("input.wide")), "input");
        assert_eq!(tag_of(&session, Locator::css("[name='user_name']")), "input");
        assert_eq!(tag_of(&session, Locator::css("form")), "form");
        assert!(matches!(
            session.find(&Locator::css("div > span")),
            Err(SessionError::Other(_))
        ));
    }

    #[test]
    fn test_xpath_forms() {
        let session = SnapshotSession::new(login_page());
        assert_eq!(tag_of(&session, Locator::xpath("//h1")), "h1");
        assert_eq!(tag_of(&session, Locator::xpath("//*")), "html");
        assert_eq!(
            tag_of(&session, Locator::xpath("//*[@id='submit']")),
            "button"
        );
        assert_eq!(
            tag_of(&session, Locator::xpath("//input[@name=\"user_name\"]")),
            "input"
        );
        assert_eq!(
            tag_of(&session, Locator::xpath("//*[contains(@href, 'forgot')]")),
            "a"
        );
        assert!(matches!(
            session.find(&Locator::xpath("/html/body")),
            Err(SessionError::Other(_))
        ));
    }

    #[test]
    fn test_xpath_concat_literal() {
        let session = SnapshotSession::new(DomSnapshot::new(
            DomNode::new("div").with_child(DomNode::new("span").with_attr("id", "a'b\"c")),
        ));
        let query = format!("//*[@id={}]", crate::strategies::xpath_literal("a'b\"c"));
        assert_eq!(query, "//*[@id=concat('a', \"'\", 'b\"c')]");
        assert_eq!(tag_of(&session, Locator::xpath(query)), "span");
        assert_eq!(
            tag_of(
                &session,
                Locator::xpath("//span[contains(@id, concat('b', '\"c'))]")
            ),
            "span"
        );
        assert!(matches!(
            session.find(&Locator::xpath("//*[@id=concat('a', b)]")),
            Err(SessionError::Other(_))
        ));
    }

    #[test]
    fn test_xpath_namespaced_tag() {
        let session = SnapshotSession::new(DomSnapshot::new(
            DomNode::new("svg").with_child(DomNode::new("svg:rect").with_attr("id", "bar")),
        ));
        assert_eq!(tag_of(&session, Locator::xpath("//svg:rect")), "svg:rect");
        assert_eq!(
            tag_of(&session, Locator::xpath("//svg:rect[@id='bar']")),
            "svg:rect"
        );
    }

    #[test]
    fn test_not_found() {
        let session = SnapshotSession::new(login_page());
        let err = session
            .find(&Locator::xpath("//input[@id='nonexistent']"))
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().starts_with("no such element"));
    }

    #[test]
    fn test_first_match_in_document_order() {
        let session = SnapshotSession::new(DomSnapshot::new(
            DomNode::new("div")
                .with_child(DomNode::new("p").with_attr("id", "first"))
                .with_child(DomNode::new("p").with_attr("id", "second")),
        ));
        let element = session.find(&Locator::xpath("//p")).unwrap();
        assert_eq!(element.attr("id"), Some("first"));
        assert_eq!(element.index(), 1);
    }

    #[test]
    fn test_injected_failure_and_call_log() {
        let session = SnapshotSession::new(login_page());
        session.fail_with(
            Locator::id("submit"),
            SessionError::Timeout("script timeout".into()),
        );
        assert!(matches!(
            session.find(&Locator::id("submit")),
            Err(SessionError::Timeout(_))
        ));
        session.current_document().unwrap();
        assert_eq!(
            session.calls(),
            vec![
                SessionCall::Find(Locator::id("submit")),
                SessionCall::CurrentDocument
            ]
        );
        session.clear_calls();
        assert!(session.calls().is_empty());
        assert_eq!(tag_of(&session, Locator::name("user_name")), "input");
        assert_eq!(session.find_calls(), vec![Locator::name("user_name")]);
    }

    #[test]
    fn test_send_keys_records_text() {
        let session = SnapshotSession::new(login_page());
        let element = session.find(&Locator::name("user_name")).unwrap();
        element.send_keys("Testing ").unwrap();
        element.send_keys("Self-Healing").unwrap();
        assert_eq!(element.typed_text(), "Testing Self-Healing");
    }
}
