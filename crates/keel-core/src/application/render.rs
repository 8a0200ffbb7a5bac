//! Two-stage rendering: the view, then the layout around it.

use tracing::{debug, trace};

use crate::application::ApplicationError;
use crate::application::controller::{ERROR_ACTION, EXCEPTION_VIEW, HookPoint, NOT_FOUND_VIEW};
use crate::application::dispatch::ActionContext;
use crate::application::ports::{TemplateRenderer, TemplateStore};
use crate::domain::{CONTENT_TYPE, Response, ViewState, format, naming};
use crate::error::{KeelError, KeelResult};

/// Ordered template directories, most specific first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSearchStack {
    dirs: Vec<String>,
}

impl TemplateSearchStack {
    pub fn new<I, S>(dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn dirs(&self) -> &[String] {
        &self.dirs
    }

    /// Replace the directories, e.g. when moving from views to layouts.
    pub fn rebind<I, S>(&mut self, dirs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dirs = dirs.into_iter().map(Into::into).collect();
    }

    /// First `dir/name` the store knows about, with its source.
    pub fn find(&self, store: &dyn TemplateStore, name: &str) -> KeelResult<(String, String)> {
        for dir in &self.dirs {
            let path = format!("{}/{}", dir.trim_end_matches('/'), name);
            trace!(%path, "template lookup");
            if let Some(source) = store.load(&path)? {
                return Ok((path, source));
            }
        }
        Err(ApplicationError::TemplateNotFound {
            name: name.to_owned(),
            searched: self.dirs.clone(),
        }
        .into())
    }

    /// Resolve `name` and execute it against `vars`.
    pub fn fetch(
        &self,
        store: &dyn TemplateStore,
        renderer: &dyn TemplateRenderer,
        name: &str,
        vars: &ViewState,
    ) -> KeelResult<String> {
        let (path, source) = self.find(store, name)?;
        debug!(%path, "rendering template");
        renderer.render(&path, &source, vars)
    }
}

/// Render the current view and layout into the response body.
pub(crate) fn render(cx: &mut ActionContext<'_>) -> KeelResult<()> {
    let spec = cx.spec;
    let services = cx.services;
    let settings = &services.settings;

    if !spec.uses_layout_for(cx.state.format.as_deref()) {
        cx.state.layout = None;
    }

    if cx.state.view.is_none() && cx.state.layout.is_none() {
        negotiate(
            &mut cx.state.response,
            cx.state.format.as_deref(),
            settings.charset.as_deref(),
        );
        return Ok(());
    }

    let mut stack = TemplateSearchStack::new(spec.view_dirs().iter().cloned());
    inject_reserved(cx);
    cx.fire(HookPoint::PreRender)?;

    if let Some(view) = cx.state.view.clone() {
        let (path, source) = match cx.state.format.clone() {
            None => stack.find(services.templates.as_ref(), &settings.template_file(&view))?,
            Some(tag) => {
                let file = settings.template_file(&format!("{view}.{tag}"));
                match stack.find(services.templates.as_ref(), &file) {
                    Err(KeelError::Application(ApplicationError::TemplateNotFound { .. }))
                        if is_dispatcher_view(&view) =>
                    {
                        debug!(%view, format = %tag, "no format variant, using plain view");
                        cx.state.format = None;
                        stack.find(services.templates.as_ref(), &settings.template_file(&view))?
                    }
                    found => found?,
                }
            }
        };
        debug!(%path, "rendering template");
        let body = services.renderer.render(&path, &source, &cx.state.vars)?;
        cx.state.response.set_body(body);
    }

    if let Some(layout) = cx.state.layout.clone() {
        match spec.layout_dirs() {
            Some(dirs) => stack.rebind(dirs.iter().cloned()),
            None => stack.rebind(settings.layout_dirs.iter().cloned()),
        }
        let content = cx.state.response.take_body();
        cx.state.vars.assign(settings.layout_var.clone(), content);
        let body = stack.fetch(
            services.templates.as_ref(),
            services.renderer.as_ref(),
            &settings.template_file(&layout),
            &cx.state.vars,
        )?;
        cx.state.response.set_body(body);
    }

    negotiate(
        &mut cx.state.response,
        cx.state.format.as_deref(),
        settings.charset.as_deref(),
    );
    cx.fire(HookPoint::PostRender)?;
    Ok(())
}

/// Views the dispatcher selects on its own; they fall back to the plain
/// template when the requested format has no variant.
fn is_dispatcher_view(view: &str) -> bool {
    view == NOT_FOUND_VIEW || view == EXCEPTION_VIEW || view == naming::action_view(ERROR_ACTION)
}

fn inject_reserved(cx: &mut ActionContext<'_>) {
    let state = &mut *cx.state;
    let errors: Vec<String> = state.errors.iter().map(ToString::to_string).collect();
    state.vars.assign("controller", state.controller.clone());
    state.vars.assign("action", state.action.clone());
    state.vars.assign("layout", state.layout.clone());
    state.vars.assign("format", state.format.clone());
    state.vars.assign("errors", errors);
}

/// Set `Content-Type` from the format table unless something already did.
fn negotiate(response: &mut Response, format: Option<&str>, charset: Option<&str>) {
    if response.has_header(CONTENT_TYPE) {
        return;
    }
    let mime = format::content_type(format).unwrap_or(format::DEFAULT_CONTENT_TYPE);
    response.set_header(CONTENT_TYPE, format::with_charset(mime, charset));
}
