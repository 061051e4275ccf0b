use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, trace};

use crate::config::HtmlConfig;

/// What a layout needs to know about the request being answered.
pub trait RequestContext {
    /// Looks up a request header. Names compare case-insensitively.
    fn header(&self, name: &str) -> Option<&str>;

    /// A header is truthy when it is present and not empty.
    fn has_truthy_header(&self, name: &str) -> bool {
        self.header(name).is_some_and(|v| !v.is_empty())
    }
}

impl<C: RequestContext + ?Sized> RequestContext for &C {
    fn header(&self, name: &str) -> Option<&str> {
        (**self).header(name)
    }
}

/// A request without headers.
impl RequestContext for () {
    fn header(&self, _name: &str) -> Option<&str> {
        None
    }
}

impl RequestContext for HashMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Request headers in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Headers(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl RequestContext for Headers {
    fn header(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Registration options for [`Scope::add_layout`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutOptions {
    skip_on_header: Option<String>,
}

impl LayoutOptions {
    /// Bypass the layout for requests carrying a truthy `name` header,
    /// e.g. `hx-request` for partial page updates.
    pub fn skip_on_header(name: impl Into<String>) -> Self {
        let name = name.into().to_ascii_lowercase();
        Self {
            skip_on_header: (!name.is_empty()).then_some(name),
        }
    }
}

struct LayoutNode<F, C: ?Sized> {
    render: Arc<dyn Fn(F, &C) -> F + Send + Sync>,
    parent: Option<Arc<LayoutNode<F, C>>>,
    skip_on_header: Option<String>,
}

impl<F, C: RequestContext + ?Sized> LayoutNode<F, C> {
    fn skipped_for(&self, context: &C) -> bool {
        self.skip_on_header
            .as_deref()
            .is_some_and(|name| context.has_truthy_header(name))
    }
}

impl<F, C: ?Sized> Drop for LayoutNode<F, C> {
    // Unlinks the chain one node at a time instead of letting drop recurse
    // through every parent.
    fn drop(&mut self) {
        let mut next = self.parent.take();
        while let Some(node) = next {
            next = match Arc::try_unwrap(node) {
                Ok(mut owned) => owned.parent.take(),
                Err(_) => None,
            };
        }
    }
}

/// An encapsulation scope owning a layout chain of `F` fragments.
pub struct Scope<F, C: ?Sized> {
    head: Option<Arc<LayoutNode<F, C>>>,
    config: Arc<HtmlConfig>,
}

pub type HtmlScope<C = Headers> = Scope<String, C>;

impl<F, C: ?Sized> Clone for Scope<F, C> {
    fn clone(&self) -> Self {
        Self {
            head: self.head.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<F, C: ?Sized> Default for Scope<F, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F, C: ?Sized> fmt::Debug for Scope<F, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("layouts", &self.layouts())
            .field("config", &self.config)
            .finish()
    }
}

impl<F, C: ?Sized> Scope<F, C> {
    pub fn new() -> Self {
        Self::with_config(HtmlConfig::default())
    }

    pub fn with_config(config: HtmlConfig) -> Self {
        Self {
            head: None,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &HtmlConfig {
        &self.config
    }

    /// A nested scope starting from this scope's current layouts.
    pub fn child(&self) -> Self {
        self.clone()
    }

    /// Number of layouts visible from this scope.
    pub fn layouts(&self) -> usize {
        let mut count = 0;
        let mut node = self.head.as_deref();
        while let Some(n) = node {
            count += 1;
            node = n.parent.as_deref();
        }
        count
    }
}

impl<F, C: RequestContext + ?Sized> Scope<F, C> {
    pub fn add_layout<R>(&mut self, render: R, options: LayoutOptions)
    where
        R: Fn(F, &C) -> F + Send + Sync + 'static,
    {
        let node = LayoutNode {
            render: Arc::new(render),
            parent: self.head.take(),
            skip_on_header: options.skip_on_header,
        };
        self.head = Some(Arc::new(node));
    }

    /// Wraps `fragment` in every applicable layout, innermost first.
    pub fn apply_layouts(&self, mut fragment: F, context: &C) -> F {
        let mut node = self.head.as_deref();
        let mut depth = 0usize;
        while let Some(n) = node {
            if n.skipped_for(context) {
                debug!(
                    "skipping layout {depth} for header {:?}",
                    n.skip_on_header.as_deref().unwrap_or_default()
                );
            } else {
                trace!("applying layout {depth}");
                fragment = (n.render)(fragment, context);
            }
            node = n.parent.as_deref();
            depth += 1;
        }
        fragment
    }
}
