//! Controller definitions: actions, hooks and template directories.
//!
//! A [`ControllerSpec`] is built once at startup and registered with the
//! [`ControllerRegistry`](crate::application::ControllerRegistry). Actions
//! are stored under their action key (`read-more` → `actionReadMore`), so
//! lookup is a map access rather than name-based reflection.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::application::dispatch::ActionContext;
use crate::domain::{DomainError, naming};

/// Error type returned by actions and hooks; anything implementing
/// `std::error::Error` converts with `?`.
pub type HandlerError = Box<dyn Error + Send + Sync>;
pub type HandlerResult = Result<(), HandlerError>;

/// View rendered when an action cannot be resolved.
pub const NOT_FOUND_VIEW: &str = "notFound";
/// View rendered when a fault is trapped at the dispatch boundary.
pub const EXCEPTION_VIEW: &str = "exception";
/// Action reached through [`ActionContext::error`].
pub const ERROR_ACTION: &str = "error";
/// Search directory holding the built-in `notFound`, `exception` and `error` views.
pub const BUILTIN_VIEW_DIR: &str = "keel/controller/view";

/// One action of a controller.
///
/// Closures with the matching signature implement this automatically.
pub trait ActionHandler: Send + Sync {
    fn call(&self, cx: &mut ActionContext<'_>, params: &[String]) -> HandlerResult;
}

impl<F> ActionHandler for F
where
    F: Fn(&mut ActionContext<'_>, &[String]) -> HandlerResult + Send + Sync,
{
    fn call(&self, cx: &mut ActionContext<'_>, params: &[String]) -> HandlerResult {
        self(cx, params)
    }
}

pub type Hook = Arc<dyn Fn(&mut ActionContext<'_>) -> HandlerResult + Send + Sync>;

/// Points in the dispatch cycle where hooks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    /// Once per request, before the first forward.
    PreRun,
    /// Before every forward, including nested ones.
    PreAction,
    /// After every forward.
    PostAction,
    /// Once per request, after the top-level forward.
    PostRun,
    PreRender,
    PostRender,
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PreRun => "pre_run",
            Self::PreAction => "pre_action",
            Self::PostAction => "post_action",
            Self::PostRun => "post_run",
            Self::PreRender => "pre_render",
            Self::PostRender => "post_render",
        };
        f.write_str(name)
    }
}

/// Ordered hook lists per [`HookPoint`].
#[derive(Clone, Default)]
pub struct Hooks {
    points: HashMap<HookPoint, Vec<Hook>>,
}

impl Hooks {
    pub fn at(&self, point: HookPoint) -> &[Hook] {
        self.points.get(&point).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn push(&mut self, point: HookPoint, hook: Hook) {
        self.points.entry(point).or_default().push(hook);
    }

    pub fn len(&self) -> usize {
        self.points.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<_> = self
            .points
            .iter()
            .map(|(point, hooks)| (point.to_string(), hooks.len()))
            .collect();
        counts.sort();
        f.debug_map().entries(counts).finish()
    }
}

/// A registered controller.
#[derive(Clone)]
pub struct ControllerSpec {
    name: String,
    actions: HashMap<String, Arc<dyn ActionHandler>>,
    hooks: Hooks,
    view_dirs: Vec<String>,
    layout_dirs: Option<Vec<String>>,
    default_action: Option<String>,
    default_layout: Option<String>,
    action_formats: HashMap<String, Vec<String>>,
    layout_formats: Vec<String>,
}

impl ControllerSpec {
    pub fn builder(name: impl Into<String>) -> ControllerBuilder {
        ControllerBuilder::new(name)
    }

    /// The fallback controller: every action is "not found" except `error`.
    pub fn generic() -> Self {
        ControllerBuilder::new("").build_unchecked()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_generic(&self) -> bool {
        self.name.is_empty()
    }

    /// Handler registered for `action`, if any.
    pub fn action(&self, action: &str) -> Option<&Arc<dyn ActionHandler>> {
        if action.is_empty() {
            return None;
        }
        self.actions.get(&naming::action_key(action))
    }

    pub fn has_action(&self, action: &str) -> bool {
        self.action(action).is_some()
    }

    /// Action keys, sorted.
    pub fn action_keys(&self) -> Vec<&str> {
        let mut keys: Vec<_> = self.actions.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// View search directories, most specific first.
    pub fn view_dirs(&self) -> &[String] {
        &self.view_dirs
    }

    /// Layout search directories; `None` means the application-wide ones.
    pub fn layout_dirs(&self) -> Option<&[String]> {
        self.layout_dirs.as_deref()
    }

    pub fn default_action(&self) -> Option<&str> {
        self.default_action.as_deref()
    }

    pub fn default_layout(&self) -> Option<&str> {
        self.default_layout.as_deref()
    }

    /// Formats accepted by `action`: the `*` list merged with any list
    /// declared under the action's dash, camel or key spelling.
    /// Empty means every format is accepted.
    pub fn allowed_formats(&self, action: &str) -> Vec<String> {
        let mut allowed: Vec<String> = Vec::new();
        let keys = std::iter::once("*".to_owned()).chain(naming::action_format_keys(action));
        for key in keys {
            for tag in self.action_formats.get(&key).into_iter().flatten() {
                if !allowed.contains(tag) {
                    allowed.push(tag.clone());
                }
            }
        }
        allowed
    }

    /// Whether a layout wraps output in `format`; no format always does.
    pub fn uses_layout_for(&self, format: Option<&str>) -> bool {
        match format {
            None => true,
            Some(tag) => self.layout_formats.iter().any(|f| f == tag),
        }
    }
}

impl fmt::Debug for ControllerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerSpec")
            .field("name", &self.name)
            .field("actions", &self.action_keys())
            .field("hooks", &self.hooks)
            .field("view_dirs", &self.view_dirs)
            .field("layout_dirs", &self.layout_dirs)
            .field("default_action", &self.default_action)
            .field("default_layout", &self.default_layout)
            .field("layout_formats", &self.layout_formats)
            .finish_non_exhaustive()
    }
}

fn noop(_: &mut ActionContext<'_>, _: &[String]) -> HandlerResult {
    Ok(())
}

/// Builder for [`ControllerSpec`].
///
/// # Example
///
/// ```rust
/// use keel_core::application::{ControllerSpec, HookPoint};
///
/// let blog = ControllerSpec::builder("blog")
///     .default_action("index")
///     .action("index", |cx, _params| {
///         cx.assign("title", "Recent posts");
///         Ok(())
///     })
///     .action("show", |cx, params| {
///         let id = cx.param(0, "0").to_owned();
///         cx.assign("id", id);
///         Ok(())
///     })
///     .hook(HookPoint::PreRender, |cx| {
///         cx.assign("site", "Keel");
///         Ok(())
///     })
///     .build()
///     .unwrap();
///
/// assert!(blog.has_action("show"));
/// ```
pub struct ControllerBuilder {
    spec: ControllerSpec,
    extra_view_dirs: Vec<String>,
    parents: Vec<ControllerSpec>,
}

impl ControllerBuilder {
    fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut actions: HashMap<String, Arc<dyn ActionHandler>> = HashMap::new();
        actions.insert(naming::action_key(ERROR_ACTION), Arc::new(noop));

        Self {
            spec: ControllerSpec {
                name,
                actions,
                hooks: Hooks::default(),
                view_dirs: Vec::new(),
                layout_dirs: None,
                default_action: None,
                default_layout: None,
                action_formats: HashMap::new(),
                layout_formats: vec!["xhtml".to_owned()],
            },
            extra_view_dirs: Vec::new(),
            parents: Vec::new(),
        }
    }

    /// Register `handler` under the action `name` (dash or camel case).
    pub fn action<F>(self, name: &str, handler: F) -> Self
    where
        F: Fn(&mut ActionContext<'_>, &[String]) -> HandlerResult + Send + Sync + 'static,
    {
        self.action_handler(name, Arc::new(handler))
    }

    /// Register a shared handler value.
    pub fn action_handler(mut self, name: &str, handler: Arc<dyn ActionHandler>) -> Self {
        self.spec.actions.insert(naming::action_key(name), handler);
        self
    }

    pub fn hook<F>(mut self, point: HookPoint, hook: F) -> Self
    where
        F: Fn(&mut ActionContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.spec.hooks.push(point, Arc::new(hook));
        self
    }

    /// Add a view directory searched before the conventional ones.
    pub fn view_dir(mut self, dir: impl Into<String>) -> Self {
        self.extra_view_dirs.push(dir.into());
        self
    }

    pub fn layout_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.layout_dirs = Some(dirs.into_iter().map(Into::into).collect());
        self
    }

    pub fn default_action(mut self, action: impl Into<String>) -> Self {
        self.spec.default_action = Some(action.into());
        self
    }

    pub fn default_layout(mut self, layout: impl Into<String>) -> Self {
        self.spec.default_layout = Some(layout.into());
        self
    }

    /// Restrict formats for `action`; `*` applies to every action.
    pub fn action_formats<I, S>(mut self, action: &str, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec
            .action_formats
            .entry(action.to_owned())
            .or_default()
            .extend(formats.into_iter().map(Into::into));
        self
    }

    /// Add a format that is wrapped in the layout (besides no format).
    pub fn layout_format(mut self, format: impl Into<String>) -> Self {
        let format = format.into();
        if !self.spec.layout_formats.contains(&format) {
            self.spec.layout_formats.push(format);
        }
        self
    }

    /// Start from `parent`: its actions, hooks and formats are inherited
    /// and its view directories are searched after this controller's.
    pub fn extends(mut self, parent: &ControllerSpec) -> Self {
        self.parents.push(parent.clone());
        self
    }

    pub fn build(self) -> Result<ControllerSpec, DomainError> {
        let name = &self.spec.name;
        if name.is_empty() {
            return Err(DomainError::InvalidControllerName {
                name: name.clone(),
                reason: "name is empty".into(),
            });
        }
        if name.contains('/') {
            return Err(DomainError::InvalidControllerName {
                name: name.clone(),
                reason: "name contains '/'".into(),
            });
        }
        Ok(self.build_unchecked())
    }

    fn build_unchecked(self) -> ControllerSpec {
        let Self {
            mut spec,
            extra_view_dirs,
            parents,
        } = self;

        let mut view_dirs = extra_view_dirs;
        if !spec.name.is_empty() {
            view_dirs.push(format!(
                "app/controller/{}/view",
                naming::dashes_to_studly(&spec.name)
            ));
        }

        for parent in parents.iter().rev() {
            for (key, handler) in &parent.actions {
                spec.actions
                    .entry(key.clone())
                    .or_insert_with(|| Arc::clone(handler));
            }
            for (key, formats) in &parent.action_formats {
                spec.action_formats
                    .entry(key.clone())
                    .or_insert_with(|| formats.clone());
            }
            let mut hooks = parent.hooks.clone();
            for (point, own) in std::mem::take(&mut spec.hooks.points) {
                for hook in own {
                    hooks.push(point, hook);
                }
            }
            spec.hooks = hooks;
            if spec.default_action.is_none() {
                spec.default_action = parent.default_action.clone();
            }
            if spec.default_layout.is_none() {
                spec.default_layout = parent.default_layout.clone();
            }
        }

        for parent in &parents {
            for dir in &parent.view_dirs {
                if dir != BUILTIN_VIEW_DIR && !view_dirs.contains(dir) {
                    view_dirs.push(dir.clone());
                }
            }
        }
        view_dirs.push(BUILTIN_VIEW_DIR.to_owned());
        spec.view_dirs = view_dirs;
        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(_: &mut ActionContext<'_>, _: &[String]) -> HandlerResult {
        Ok(())
    }

    #[test]
    fn actions_are_keyed_by_convention() {
        let spec = ControllerSpec::builder("blog")
            .action("read-more", ok)
            .build()
            .unwrap();

        assert!(spec.has_action("read-more"));
        assert!(spec.has_action("readMore"));
        assert!(!spec.has_action("show"));
        assert!(!spec.has_action(""));
        assert_eq!(spec.action_keys(), ["actionError", "actionReadMore"]);
    }

    #[test]
    fn view_dirs_most_specific_first() {
        let spec = ControllerSpec::builder("blog-post")
            .view_dir("themes/dark/blog")
            .build()
            .unwrap();
        assert_eq!(
            spec.view_dirs(),
            [
                "themes/dark/blog",
                "app/controller/BlogPost/view",
                BUILTIN_VIEW_DIR
            ]
        );
    }

    #[test]
    fn generic_controller_only_has_error() {
        let spec = ControllerSpec::generic();
        assert!(spec.is_generic());
        assert!(spec.has_action(ERROR_ACTION));
        assert!(!spec.has_action("index"));
        assert_eq!(spec.view_dirs(), [BUILTIN_VIEW_DIR]);
    }

    #[test]
    fn rejects_bad_names() {
        assert!(ControllerSpec::builder("").build().is_err());
        assert!(ControllerSpec::builder("a/b").build().is_err());
    }

    #[test]
    fn allowed_formats_merge_all_spellings() {
        let spec = ControllerSpec::builder("feed")
            .action("read-more", ok)
            .action_formats("*", ["xml"])
            .action_formats("read-more", ["json"])
            .action_formats("actionReadMore", ["rss", "json"])
            .build()
            .unwrap();

        assert_eq!(spec.allowed_formats("read-more"), ["xml", "json", "rss"]);
        assert_eq!(spec.allowed_formats("other"), ["xml"]);
    }

    #[test]
    fn layout_formats_default_to_xhtml() {
        let spec = ControllerSpec::builder("x").build().unwrap();
        assert!(spec.uses_layout_for(None));
        assert!(spec.uses_layout_for(Some("xhtml")));
        assert!(!spec.uses_layout_for(Some("json")));
    }

    #[test]
    fn extends_inherits_actions_and_dirs() {
        let base = ControllerSpec::builder("base")
            .action("index", ok)
            .default_layout("main")
            .hook(HookPoint::PreRun, |_| Ok(()))
            .build()
            .unwrap();
        let child = ControllerSpec::builder("child")
            .extends(&base)
            .action("show", ok)
            .hook(HookPoint::PreRun, |_| Ok(()))
            .build()
            .unwrap();

        assert!(child.has_action("index"));
        assert!(child.has_action("show"));
        assert_eq!(child.default_layout(), Some("main"));
        assert_eq!(child.hooks().at(HookPoint::PreRun).len(), 2);
        assert_eq!(
            child.view_dirs(),
            [
                "app/controller/Child/view",
                "app/controller/Base/view",
                BUILTIN_VIEW_DIR
            ]
        );
    }

    #[test]
    fn hook_point_names() {
        assert_eq!(HookPoint::PreAction.to_string(), "pre_action");
        assert_eq!(HookPoint::PostRender.to_string(), "post_render");
    }
}
