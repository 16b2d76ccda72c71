//! Inclusion resolver.
//!
//! A run walks the root document, resolves each directive and splices a
//! deep copy of the result in place of the directive. Fetched content is
//! resolved in place *before* it is copied, so every later use of the same
//! [`ResolutionKey`] reuses the finished fragment instead of fetching again.
//!
//! Failures are local to the directive that caused them. At the top level
//! they are logged at `warn` and, in diagnostics mode, replaced by a visible
//! marker element; inside included content they are dropped quietly. Either
//! way a [`Diagnostic`] is recorded.

use std::sync::Arc;

use weave_dom::{Dom, NodeId, NodeKind, Selector, to_xml};
use weave_source::{ContentSource, Locator};

use crate::cache::{ContentForm, ResolutionCache, ResolutionKey};
use crate::deps::DependencyTracker;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::directive::{DOCUMENT_SELECTOR, Directive, ParseMode, TagNames};
use crate::error::{IncludeError, LoadError};
use crate::guard::RecursionGuard;

/// Default limit on nested inclusions.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Maximum nesting of includes below the root document.
    pub max_depth: usize,
    /// Replace failed top-level directives with marker elements instead of
    /// removing them.
    pub diagnostics: bool,
    /// Element names for directives, fallbacks, escapes and markers.
    pub tags: TagNames,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            diagnostics: false,
            tags: TagNames::default(),
        }
    }
}

/// Output of a resolution run.
#[derive(Debug)]
pub struct ResolvedDocument {
    /// Arena holding the resolved tree (and detached fetched content).
    pub dom: Dom,
    /// Document node of the resolved root.
    pub root: NodeId,
    /// Root locator.
    pub locator: Locator,
    /// Every locator read or requested, root first.
    pub dependencies: Vec<Locator>,
    /// Directives that failed or found nothing, in resolution order.
    pub diagnostics: Vec<Diagnostic>,
}

impl ResolvedDocument {
    /// Serialize the resolved tree.
    #[must_use]
    pub fn to_xml(&self) -> String {
        to_xml(&self.dom, self.root)
    }

    /// Diagnostics raised by directives of the root document itself.
    pub fn top_level_diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.nested)
    }
}

/// Resolves inclusion directives against a [`ContentSource`].
///
/// The resolver holds no per-run state; each [`load`](Self::load) builds its
/// own cache, guard and tracker, so one resolver can serve concurrent loads.
pub struct InclusionResolver {
    source: Arc<dyn ContentSource>,
    options: ResolverOptions,
}

impl InclusionResolver {
    /// Create a resolver reading through `source`.
    #[must_use]
    pub fn new(source: Arc<dyn ContentSource>, options: ResolverOptions) -> Self {
        Self { source, options }
    }

    /// Resolver configuration.
    #[must_use]
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Content source used for every fetch.
    #[must_use]
    pub fn source(&self) -> &dyn ContentSource {
        self.source.as_ref()
    }

    /// Fetch the document at `locator` and resolve all its directives.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] only when the root document itself cannot be
    /// fetched or parsed. Directive failures are reported as diagnostics.
    pub fn load(&self, locator: &Locator) -> Result<ResolvedDocument, LoadError> {
        let mut dom = Dom::new();
        let fetched = self
            .source
            .fetch_structured(locator, &mut dom)
            .map_err(|source| LoadError::Root {
                locator: locator.clone(),
                source,
            })?;
        Ok(self.run(dom, fetched.document, &fetched.dependencies))
    }

    /// Resolve a document the caller has already parsed into `dom`.
    ///
    /// The document's URI is used as its locator for relative references.
    #[must_use]
    pub fn resolve_document(&self, dom: Dom, document: NodeId) -> ResolvedDocument {
        let document = dom.document_of(document);
        self.run(dom, document, &[])
    }

    fn run(&self, dom: Dom, document: NodeId, fetched: &[Locator]) -> ResolvedDocument {
        let locator = Locator::new(dom.uri(document));
        let root_key = ResolutionKey::markup(locator.clone(), DOCUMENT_SELECTOR);

        let mut deps = DependencyTracker::new();
        deps.record(&locator);
        deps.extend(fetched);

        let mut run = Run {
            source: self.source.as_ref(),
            options: &self.options,
            dom,
            cache: ResolutionCache::new(root_key.clone(), document),
            guard: RecursionGuard::new(root_key),
            deps,
            diagnostics: Vec::new(),
        };
        run.resolve_all(document);

        let dependencies = run.deps.into_vec();
        tracing::debug!(
            locator = %locator,
            dependencies = dependencies.len(),
            diagnostics = run.diagnostics.len(),
            fragments = run.cache.len(),
            "Resolved document"
        );

        ResolvedDocument {
            dom: run.dom,
            root: document,
            locator,
            dependencies,
            diagnostics: run.diagnostics,
        }
    }
}

/// State of one resolution run.
struct Run<'a> {
    source: &'a dyn ContentSource,
    options: &'a ResolverOptions,
    dom: Dom,
    cache: ResolutionCache,
    guard: RecursionGuard,
    deps: DependencyTracker,
    diagnostics: Vec<Diagnostic>,
}

impl Run<'_> {
    /// Resolve every directive below `subtree`, in document order.
    fn resolve_all(&mut self, subtree: NodeId) {
        if self.in_escape_scope(subtree) {
            tracing::debug!(node = %subtree, "Not expanding inside escape element");
            return;
        }
        for element in self.find_directives(subtree) {
            // An earlier directive may have resolved or removed this one.
            if !self.dom.is_ancestor_or_self(subtree, element) {
                continue;
            }

            let directive = Directive::extract(&self.dom, element, &self.options.tags);
            match self.resolve(&directive) {
                Ok(Some(node)) => self.splice(element, node),
                Ok(None) => match directive.fallback {
                    Some(fallback) => self.use_fallback(&directive, fallback),
                    None => self.not_found(&directive),
                },
                Err(err) => self.fail(&directive, &err),
            }
        }
    }

    /// Directive elements below `subtree`, skipping escape elements and the
    /// content of directives (their fallbacks).
    fn find_directives(&self, subtree: NodeId) -> Vec<NodeId> {
        let tags = &self.options.tags;
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.dom.children(subtree).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if self.dom.is_element_named(node, &tags.directive) {
                found.push(node);
            } else if !self.dom.is_element_named(node, &tags.escape) {
                stack.extend(self.dom.children(node).iter().rev().copied());
            }
        }
        found
    }

    /// Whether `node` is an escape element or sits inside one.
    fn in_escape_scope(&self, node: NodeId) -> bool {
        let escape = &self.options.tags.escape;
        std::iter::once(node)
            .chain(self.dom.ancestors(node))
            .any(|n| self.dom.is_element_named(n, escape))
    }

    fn resolve(&mut self, directive: &Directive) -> Result<Option<NodeId>, IncludeError> {
        directive.validate()?;
        let identity = directive.identity();

        if self.guard.depth() >= self.options.max_depth {
            return Err(IncludeError::MaxDepthExceeded {
                identity,
                max: self.options.max_depth,
            });
        }

        let host = Locator::new(self.dom.uri(directive.element));
        let locator = match &directive.href {
            Some(href) => host.resolve(href),
            None => host,
        };
        let form = match directive.parse_mode {
            ParseMode::Structured => ContentForm::Markup,
            ParseMode::RawText => ContentForm::Text(directive.encoding),
        };
        let key = ResolutionKey {
            locator,
            selector: directive.selector().to_owned(),
            form,
        };

        if let Some(node) = self.cache.get(&key) {
            if self.guard.is_active(&key) {
                return Err(IncludeError::CyclicInclusion(identity));
            }
            tracing::debug!(key = %key, "Include cache hit");
            return Ok(Some(node));
        }
        if self.cache.is_missing(&key) {
            tracing::debug!(key = %key, "Include target already known to be missing");
            return Ok(None);
        }

        let found = if directive.is_local() {
            self.select_local(directive, &identity)?
        } else {
            self.fetch(directive, &key, &identity)?
        };
        let Some(node) = found else {
            if directive.is_local() {
                if directive.fallback.is_none() {
                    return Ok(Some(self.target_not_found(directive)));
                }
            } else {
                self.cache.insert_missing(key);
            }
            return Ok(None);
        };

        self.cache.insert(key.clone(), node);
        if !matches!(self.dom.kind(node), NodeKind::Text(_) | NodeKind::Comment(_))
            && !self.in_escape_scope(node)
        {
            self.guard.enter(key);
            self.resolve_all(node);
            self.guard.leave();
        }
        Ok(Some(node))
    }

    /// Evaluate the selector against the directive's own document.
    fn select_local(
        &mut self,
        directive: &Directive,
        identity: &str,
    ) -> Result<Option<NodeId>, IncludeError> {
        let selector = Selector::parse(directive.selector())
            .map_err(|e| IncludeError::failed(identity, &e))?;
        let document = self.dom.document_of(directive.element);

        let Some(node) = selector.select_first(&self.dom, document) else {
            return Ok(None);
        };
        if self.dom.is_ancestor_or_self(node, directive.element) {
            return Err(IncludeError::CyclicInclusion(identity.to_owned()));
        }

        Ok(Some(match directive.parse_mode {
            ParseMode::Structured => node,
            ParseMode::RawText => {
                let text = self.dom.text_content(node);
                self.dom.create_text(document, text)
            }
        }))
    }

    /// Fetch external content for `key`.
    ///
    /// A resource that does not exist is `Ok(None)`; the locator is still a
    /// dependency.
    fn fetch(
        &mut self,
        directive: &Directive,
        key: &ResolutionKey,
        identity: &str,
    ) -> Result<Option<NodeId>, IncludeError> {
        let locator = &key.locator;
        self.deps.record(locator);

        match key.form {
            ContentForm::Text(encoding) => match self.source.fetch_text(locator, encoding) {
                Ok(text) => Ok(Some(self.dom.create_text(directive.element, text))),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(IncludeError::failed(identity, &e)),
            },
            ContentForm::Markup => {
                let selector =
                    Selector::parse(&key.selector).map_err(|e| IncludeError::failed(identity, &e))?;
                let fetched = match self.source.fetch_structured(locator, &mut self.dom) {
                    Ok(fetched) => fetched,
                    Err(e) if e.is_not_found() => return Ok(None),
                    Err(e) => return Err(IncludeError::failed(identity, &e)),
                };
                self.deps.extend(&fetched.dependencies);
                Ok(selector.select_first(&self.dom, fetched.document))
            }
        }
    }

    /// Replace `element` with a copy of `node`.
    fn splice(&mut self, element: NodeId, node: NodeId) {
        let copy = self.dom.import(node, element);
        let spliced = if self.dom.kind(copy).is_container() {
            self.dom.replace_with_children(element, copy)
        } else {
            self.dom.replace(element, copy)
        };
        if !spliced {
            tracing::debug!(node = %element, "Directive detached before splicing");
        }
    }

    fn use_fallback(&mut self, directive: &Directive, fallback: NodeId) {
        tracing::debug!(identity = %directive.identity(), "Using include fallback");

        let fragment = self.dom.create_fragment(directive.element);
        for child in self.dom.children(fallback).to_vec() {
            let copy = self.dom.import(child, directive.element);
            self.dom.append(fragment, copy);
        }
        self.resolve_all(fragment);
        self.dom.replace_with_children(directive.element, fragment);
    }

    fn not_found(&mut self, directive: &Directive) {
        let message = format!("NOT FOUND: {}", directive.identity());
        self.report(directive, DiagnosticKind::NotFound, &message);

        if self.options.diagnostics {
            let marker = self.marker(directive.element, DiagnosticKind::NotFound, &message);
            self.dom.replace(directive.element, marker);
        } else {
            self.dom.detach(directive.element);
        }
    }

    /// Marker returned as the content of a local directive whose selector
    /// matched nothing.
    fn target_not_found(&mut self, directive: &Directive) -> NodeId {
        let message = format!("TARGET NOT FOUND: {}", directive.selector());
        self.report(directive, DiagnosticKind::NotFound, &message);
        self.marker(directive.element, DiagnosticKind::NotFound, &message)
    }

    fn fail(&mut self, directive: &Directive, err: &IncludeError) {
        self.report(directive, err.into(), &err.to_string());

        if self.options.diagnostics && self.guard.depth() == 0 {
            let marker = self.marker(directive.element, err.into(), &err.to_string());
            self.dom.replace(directive.element, marker);
        } else {
            self.dom.detach(directive.element);
        }
    }

    fn report(&mut self, directive: &Directive, kind: DiagnosticKind, message: &str) {
        let identity = directive.identity();
        let document = self.dom.uri(directive.element).to_owned();
        let nested = self.guard.depth() > 0;

        if nested {
            tracing::debug!(document = %document, identity = %identity, kind = %kind, "{message}");
        } else {
            tracing::warn!(document = %document, identity = %identity, kind = %kind, "{message}");
        }

        self.diagnostics.push(Diagnostic {
            identity,
            document,
            kind,
            message: message.to_owned(),
            nested,
        });
    }

    fn marker(&mut self, owner: NodeId, kind: DiagnosticKind, message: &str) -> NodeId {
        let marker = self.dom.create_element(owner, &self.options.tags.marker);
        self.dom.set_attribute(marker, "kind", kind.as_str());
        self.dom.append_text(marker, message);
        marker
    }
}
