//! Front controller - the single entry point for a request.
//!
//! This service coordinates the whole request:
//! 1. Parse the raw path into a [`Uri`]
//! 2. Rewrite it through the configured routes
//! 3. Locate the controller (with fallback)
//! 4. Let a fresh controller instance fetch the response

use std::sync::Arc;

use tracing::{field, info, info_span, instrument};
use uuid::Uuid;

use crate::{
    application::{
        ApplicationError,
        controller::ControllerSpec,
        dispatch::{ControllerInstance, RequestState, Services},
        ports::{SessionStore, TemplateRenderer, TemplateStore},
        registry::{ControllerRegistry, Resolution},
        settings::DispatchSettings,
    },
    domain::{Response, RouteResolver, RouteRule, Uri},
    error::KeelResult,
};

/// A finished request with the controller instance that served it.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub request_id: Uuid,
    pub response: Response,
    pub controller: ControllerInstance,
    pub resolution: Resolution,
}

/// Where a path would be dispatched, without running anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePlan {
    /// Path after filling an empty request and applying rewrite rules.
    pub canonical: Vec<String>,
    /// The rewrite rule that matched, if any.
    pub rule: Option<RouteRule>,
    /// Path handed to the controller (default controller prepended on fallback).
    pub dispatched: Vec<String>,
    /// Registered controller name; empty for the generic controller.
    pub controller: String,
    pub resolution: Resolution,
    pub action: String,
    /// Whether the controller has a handler for `action`.
    pub action_found: bool,
    pub params: Vec<String>,
    pub format: Option<String>,
}

/// Request dispatcher for one configured application.
#[derive(Debug)]
pub struct Application {
    services: Arc<Services>,
    registry: ControllerRegistry,
    resolver: RouteResolver,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::default()
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.services.settings
    }

    pub fn registry(&self) -> &ControllerRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &RouteResolver {
        &self.resolver
    }

    /// Dispatch `raw` (path plus optional query) and return the response.
    pub fn handle(&self, raw: &str) -> KeelResult<Response> {
        Ok(self.dispatch(raw)?.response)
    }

    /// Like [`handle`](Self::handle), but also return the controller
    /// instance so its final state can be inspected.
    #[instrument(
        name = "request",
        skip(self),
        fields(request_id = field::Empty, controller = field::Empty, action = field::Empty)
    )]
    pub fn dispatch(&self, raw: &str) -> KeelResult<DispatchOutcome> {
        let request_id = Uuid::new_v4();
        let span = tracing::Span::current();
        span.record("request_id", field::display(request_id));

        let uri = self.canonical(&Uri::parse(raw));
        let located = self
            .registry
            .locate(&uri, self.settings().default_controller.as_deref());
        span.record("controller", located.spec.name());

        let mut controller = ControllerInstance::new(located.spec, Arc::clone(&self.services));
        let response = controller.fetch(&located.uri)?;
        span.record("action", controller.action());

        info!(
            status = response.status(),
            resolution = %located.resolution,
            "request complete"
        );

        Ok(DispatchOutcome {
            request_id,
            response,
            controller,
            resolution: located.resolution,
        })
    }

    /// Work out where `raw` would go without invoking any handler.
    pub fn route(&self, raw: &str) -> RoutePlan {
        let parsed = Uri::parse(raw);
        let filled = self.filled(&parsed);
        let rule = self.resolver.matching_rule(filled.path()).cloned();
        let uri = filled.with_path(self.resolver.resolve(filled.path()));

        let located = self
            .registry
            .locate(&uri, self.settings().default_controller.as_deref());
        let state = RequestState::load(&located.spec, self.settings(), &located.uri);
        let action_found = located.spec.has_action(state.action());

        RoutePlan {
            canonical: uri.path().to_vec(),
            rule,
            dispatched: located.uri.path().to_vec(),
            controller: located.spec.name().to_owned(),
            resolution: located.resolution,
            action: state.action().to_owned(),
            action_found,
            params: state.params().to_vec(),
            format: state.format().map(str::to_owned),
        }
    }

    /// An empty path becomes the default controller (or `""`), then the
    /// rewrite rules apply.
    fn canonical(&self, uri: &Uri) -> Uri {
        let filled = self.filled(uri);
        filled.with_path(self.resolver.resolve(filled.path()))
    }

    fn filled(&self, uri: &Uri) -> Uri {
        if uri.is_root() {
            let default = self.settings().default_controller.clone().unwrap_or_default();
            uri.with_path(vec![default])
        } else {
            uri.clone()
        }
    }
}

/// Builder for [`Application`].
///
/// # Example
///
/// ```rust,ignore
/// let app = Application::builder()
///     .settings(settings)
///     .templates(Arc::new(MemoryTemplateStore::with_builtin()))
///     .renderer(Arc::new(SimpleRenderer::new()))
///     .controller(blog)
///     .build()?;
///
/// let response = app.handle("/blog/show/42")?;
/// ```
#[derive(Default)]
pub struct ApplicationBuilder {
    settings: DispatchSettings,
    controllers: Vec<ControllerSpec>,
    templates: Option<Arc<dyn TemplateStore>>,
    renderer: Option<Arc<dyn TemplateRenderer>>,
    session: Option<Arc<dyn SessionStore>>,
}

impl ApplicationBuilder {
    pub fn settings(mut self, settings: DispatchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn controller(mut self, spec: ControllerSpec) -> Self {
        self.controllers.push(spec);
        self
    }

    pub fn controllers(mut self, specs: impl IntoIterator<Item = ControllerSpec>) -> Self {
        self.controllers.extend(specs);
        self
    }

    pub fn templates(mut self, store: Arc<dyn TemplateStore>) -> Self {
        self.templates = Some(store);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn session(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session = Some(store);
        self
    }

    /// Validate the settings, compile routes and register controllers.
    pub fn build(self) -> KeelResult<Application> {
        self.settings.validate()?;
        let resolver = self.settings.resolver()?;

        let templates = self.templates.ok_or(ApplicationError::AdapterNotConfigured {
            name: "template store",
        })?;
        let renderer = self.renderer.ok_or(ApplicationError::AdapterNotConfigured {
            name: "template renderer",
        })?;

        let mut registry = ControllerRegistry::new(self.settings.controller_namespace.clone());
        for spec in self.controllers {
            registry.register(spec);
        }

        let _span = info_span!("startup").entered();
        info!(
            controllers = registry.len(),
            routes = resolver.len(),
            "application ready"
        );

        Ok(Application {
            services: Arc::new(Services {
                settings: self.settings,
                templates,
                renderer,
                session: self.session,
            }),
            registry,
            resolver,
        })
    }
}
