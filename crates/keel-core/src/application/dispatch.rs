//! Action dispatch: load, hook chain, re-entrant forward and fault trapping.
//!
//! ```text
//! fetch(uri)
//!   load ─► pre_run ─► forward(action) ─► post_run ─► render
//!                         │
//!                         ├─ pre_action
//!                         ├─ handler  (may call forward again)
//!                         ├─ post_action
//!                         └─ restore current action
//!
//! any fault ─► errors += fault, view = exception, status 500 ─► render
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::application::controller::{
    ActionHandler, ControllerSpec, EXCEPTION_VIEW, ERROR_ACTION, HandlerError, HandlerResult,
    HookPoint, NOT_FOUND_VIEW,
};
use crate::application::ports::{SessionStore, TemplateRenderer, TemplateStore};
use crate::application::session::Session;
use crate::application::settings::DispatchSettings;
use crate::application::{ApplicationError, render};
use crate::domain::{ErrorEntry, LOCATION, Response, Uri, ViewState, format, naming};
use crate::error::{KeelError, KeelResult};

/// Shared collaborators for every request.
pub struct Services {
    pub settings: DispatchSettings,
    pub templates: Arc<dyn TemplateStore>,
    pub renderer: Arc<dyn TemplateRenderer>,
    pub session: Option<Arc<dyn SessionStore>>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("settings", &self.settings)
            .field("session", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

/// Mutable state of one request inside one controller instance.
#[derive(Debug, Clone, Default)]
pub struct RequestState {
    pub(crate) controller: String,
    pub(crate) action: String,
    pub(crate) params: Vec<String>,
    pub(crate) query: BTreeMap<String, String>,
    pub(crate) format: Option<String>,
    pub(crate) view: Option<String>,
    pub(crate) layout: Option<String>,
    pub(crate) errors: Vec<ErrorEntry>,
    pub(crate) response: Response,
    pub(crate) vars: ViewState,
    pub(crate) depth: usize,
}

impl RequestState {
    /// Split `uri` into controller, action, params and format.
    ///
    /// The action falls back to the controller's default, then the
    /// configured one. Blank params are stripped from the tail only. A known
    /// format suffix on the last param (or on the action when there are no
    /// params) is removed and becomes the request format.
    pub fn load(spec: &ControllerSpec, settings: &DispatchSettings, uri: &Uri) -> Self {
        let mut cursor = uri.cursor();
        let controller = cursor.shift().unwrap_or_default().to_owned();

        let mut action = match cursor.shift() {
            Some(requested) if !requested.is_empty() => requested.to_owned(),
            _ => spec
                .default_action()
                .or(settings.default_action.as_deref())
                .unwrap_or_default()
                .to_owned(),
        };

        let mut params = cursor.remaining().to_vec();
        while params.last().is_some_and(|p| p.trim().is_empty()) {
            params.pop();
        }

        let mut format = None;
        let target = match params.last_mut() {
            Some(last) => last,
            None => &mut action,
        };
        if let Some((stem, ext)) = format::split_suffix(target) {
            let (stem, ext) = (stem.to_owned(), ext.to_owned());
            *target = stem;
            format = Some(ext);
        }

        let layout = spec
            .default_layout()
            .or(settings.default_layout.as_deref())
            .map(str::to_owned);

        Self {
            controller,
            action,
            params,
            query: uri.query().clone(),
            format,
            layout,
            ..Self::default()
        }
    }

    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn view(&self) -> Option<&str> {
        self.view.as_deref()
    }

    pub fn layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    pub fn errors(&self) -> &[ErrorEntry] {
        &self.errors
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn vars(&self) -> &ViewState {
        &self.vars
    }
}

/// A resolved action, recomputed on every forward.
pub struct ActionDescriptor<'a> {
    pub name: String,
    pub handler: &'a Arc<dyn ActionHandler>,
    pub view: String,
    pub format: Option<String>,
    pub allowed_formats: Vec<String>,
}

/// What actions, hooks and the render pipeline see of the current request.
pub struct ActionContext<'a> {
    pub(crate) spec: &'a ControllerSpec,
    pub(crate) services: &'a Services,
    pub(crate) state: &'a mut RequestState,
}

impl<'a> ActionContext<'a> {
    // ── forwarding ───────────────────────────────────────────────────────

    /// Run `action` with `params` inside the current controller.
    ///
    /// Fires `pre_action` and `post_action` around the handler. Handlers
    /// may forward again; on return the current action is `action` no
    /// matter what the nested calls did.
    pub fn forward(&mut self, action: &str, params: &[String]) -> HandlerResult {
        let max = self.services.settings.max_forward_depth;
        if self.state.depth >= max {
            warn!(action, depth = max, "forward depth exceeded");
            return Err(Box::new(KeelError::from(
                ApplicationError::ForwardLimitExceeded {
                    action: action.to_owned(),
                    depth: max,
                },
            )));
        }

        self.state.depth += 1;
        let result = self.forward_once(action, params);
        self.state.depth -= 1;
        self.state.action = action.to_owned();
        result
    }

    fn forward_once(&mut self, action: &str, params: &[String]) -> HandlerResult {
        self.state.action = action.to_owned();
        self.fire(HookPoint::PreAction)?;

        let pending = self.state.action.clone();
        match self.describe(&pending) {
            Some(descriptor) => {
                debug!(
                    action = %descriptor.name,
                    view = %descriptor.view,
                    params = params.len(),
                    "action resolved"
                );
                self.state.view = Some(descriptor.view);
                descriptor.handler.call(self, params)?;
            }
            None => self.not_found(&pending, params),
        }

        self.fire(HookPoint::PostAction)?;
        Ok(())
    }

    /// Resolve `action` against the controller, honouring format allow-lists.
    pub fn describe(&self, action: &str) -> Option<ActionDescriptor<'a>> {
        let spec = self.spec;
        let handler = spec.action(action)?;
        let allowed_formats = spec.allowed_formats(action);

        if let Some(requested) = self.state.format.as_deref() {
            if !allowed_formats.is_empty() && !allowed_formats.iter().any(|f| f == requested) {
                debug!(action, format = requested, "format not allowed for action");
                return None;
            }
        }

        Some(ActionDescriptor {
            name: action.to_owned(),
            handler,
            view: naming::action_view(action),
            format: self.state.format.clone(),
            allowed_formats,
        })
    }

    fn not_found(&mut self, action: &str, params: &[String]) {
        debug!(controller = %self.state.controller, action, "action not found");

        let format = self.state.format.clone().unwrap_or_default();
        let controller = self.state.controller.clone();
        self.push_error(format!("Controller: \"{controller}\""));
        self.push_error(format!("Action: \"{action}\""));
        self.push_error(format!("Format: \"{format}\""));
        for (index, value) in params.iter().enumerate() {
            self.push_error(format!("Param {index}: {value}"));
        }

        self.state.response.set_status(404);
        self.state.view = Some(NOT_FOUND_VIEW.to_owned());
    }

    /// Run every hook registered at `point`, in order.
    pub(crate) fn fire(&mut self, point: HookPoint) -> KeelResult<()> {
        let spec = self.spec;
        for hook in spec.hooks().at(point) {
            hook(&mut *self).map_err(|e| ApplicationError::HookFailed {
                point: point.to_string(),
                source: Arc::from(e),
            })?;
        }
        Ok(())
    }

    /// Record `message`, set status 500 and forward to the `error` action.
    pub fn error(&mut self, message: impl Into<String>) -> HandlerResult {
        self.push_error(message);
        self.state.response.set_status(500);
        self.forward(ERROR_ACTION, &[])
    }

    // ── redirects ────────────────────────────────────────────────────────

    /// Redirect with `302 Found`; nothing is rendered afterwards.
    pub fn redirect(&mut self, location: impl Into<String>) {
        self.redirect_with(location, 302);
    }

    pub fn redirect_with(&mut self, location: impl Into<String>, status: u16) {
        let response = &mut self.state.response;
        response.set_status(status);
        response.set_header(LOCATION, location);
        self.state.view = None;
        self.state.layout = None;
    }

    /// Redirect with `303 See Other` and caching disabled, for use after a
    /// successful POST.
    pub fn redirect_no_cache(&mut self, location: impl Into<String>) {
        let response = &mut self.state.response;
        response.set_header(
            "Cache-Control",
            "no-store, no-cache, must-revalidate, post-check=0, pre-check=0",
        );
        response.set_header("Pragma", "no-cache");
        self.redirect_with(location, 303);
    }

    // ── request ──────────────────────────────────────────────────────────

    /// Requested controller segment; empty for the generic controller at `/`.
    pub fn controller(&self) -> &str {
        &self.state.controller
    }

    pub fn spec(&self) -> &ControllerSpec {
        self.spec
    }

    pub fn action(&self) -> &str {
        &self.state.action
    }

    /// Change the pending action; meaningful inside a `pre_action` hook.
    pub fn set_action(&mut self, action: impl Into<String>) {
        self.state.action = action.into();
    }

    /// Positional params from the request path.
    pub fn params(&self) -> &[String] {
        &self.state.params
    }

    /// Request param at `index`, or `default` when absent.
    pub fn param<'s>(&'s self, index: usize, default: &'s str) -> &'s str {
        self.state
            .params
            .get(index)
            .map(String::as_str)
            .unwrap_or(default)
    }

    /// Query value for `key`, or `default` when absent.
    pub fn query<'s>(&'s self, key: &str, default: &'s str) -> &'s str {
        self.state
            .query
            .get(key)
            .map(String::as_str)
            .unwrap_or(default)
    }

    pub fn format(&self) -> Option<&str> {
        self.state.format.as_deref()
    }

    /// Override the response format; `None` means plain HTML.
    pub fn set_format(&mut self, tag: Option<&str>) -> KeelResult<()> {
        if let Some(tag) = tag {
            format::validate(tag)?;
        }
        self.state.format = tag.map(str::to_owned);
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.state.depth
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.services.settings
    }

    // ── view ─────────────────────────────────────────────────────────────

    pub fn view(&self) -> Option<&str> {
        self.state.view.as_deref()
    }

    pub fn set_view(&mut self, view: impl Into<String>) {
        self.state.view = Some(view.into());
    }

    pub fn clear_view(&mut self) {
        self.state.view = None;
    }

    pub fn layout(&self) -> Option<&str> {
        self.state.layout.as_deref()
    }

    pub fn set_layout(&mut self, layout: impl Into<String>) {
        self.state.layout = Some(layout.into());
    }

    pub fn clear_layout(&mut self) {
        self.state.layout = None;
    }

    pub fn assign(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.state.vars.assign(key, value);
    }

    pub fn vars(&self) -> &ViewState {
        &self.state.vars
    }

    pub fn vars_mut(&mut self) -> &mut ViewState {
        &mut self.state.vars
    }

    // ── response ─────────────────────────────────────────────────────────

    pub fn response(&self) -> &Response {
        &self.state.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.state.response
    }

    pub fn errors(&self) -> &[ErrorEntry] {
        &self.state.errors
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.state.errors.push(ErrorEntry::message(message));
    }

    // ── session ──────────────────────────────────────────────────────────

    /// Session values scoped to this controller.
    pub fn session(&self) -> KeelResult<Session<'_>> {
        let store = self
            .services
            .session
            .as_deref()
            .ok_or(ApplicationError::AdapterNotConfigured {
                name: "session store",
            })?;
        Ok(Session::new(store, self.spec.name()))
    }

    // ── request cycle ────────────────────────────────────────────────────

    fn run(&mut self, uri: &Uri) -> HandlerResult {
        *self.state = RequestState::load(self.spec, &self.services.settings, uri);
        debug!(
            controller = %self.state.controller,
            action = %self.state.action,
            params = ?self.state.params,
            format = ?self.state.format,
            "request loaded"
        );

        self.fire(HookPoint::PreRun)?;
        let action = self.state.action.clone();
        let params = self.state.params.clone();
        self.forward(&action, &params)?;
        self.fire(HookPoint::PostRun)?;

        render::render(self)?;
        Ok(())
    }

    /// Record `fault` and render the exception view directly.
    fn rescue(&mut self, fault: HandlerError) -> KeelResult<()> {
        warn!(
            controller = %self.state.controller,
            action = %self.state.action,
            error = %fault,
            "fault during fetch"
        );

        self.state.errors.push(ErrorEntry::from_error(&*fault));
        self.state.view = Some(EXCEPTION_VIEW.to_owned());
        self.state.response.set_status(500);
        render::render(self)
    }
}

/// A controller bound to one request.
#[derive(Debug)]
pub struct ControllerInstance {
    spec: Arc<ControllerSpec>,
    services: Arc<Services>,
    state: RequestState,
}

impl ControllerInstance {
    pub fn new(spec: Arc<ControllerSpec>, services: Arc<Services>) -> Self {
        Self {
            spec,
            services,
            state: RequestState::default(),
        }
    }

    /// Dispatch `uri` and return the finished response.
    ///
    /// Faults raised by hooks, actions or rendering are trapped here and
    /// rendered with the `exception` view at status 500. Only a failure to
    /// render that view reaches the caller.
    pub fn fetch(&mut self, uri: &Uri) -> KeelResult<Response> {
        let mut cx = ActionContext {
            spec: &self.spec,
            services: &self.services,
            state: &mut self.state,
        };

        if let Err(fault) = cx.run(uri) {
            cx.rescue(fault)?;
        }

        Ok(self.state.response.clone())
    }

    pub fn spec(&self) -> &ControllerSpec {
        &self.spec
    }

    /// State left behind by the last `fetch`.
    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn action(&self) -> &str {
        self.state.action()
    }

    pub fn errors(&self) -> &[ErrorEntry] {
        self.state.errors()
    }
}
