//! The ordered discovery chain.

use std::sync::Arc;

use crate::config::{ConfigSource, ProcessEnv};
use crate::context::current_context_loader;
use crate::error::FindError;
use crate::instantiate::{downcast, instantiate};
use crate::loader::{defining_loader, AnyInstance, Loader, ServiceKey, SERVICES_DIR};
use crate::module::ModuleSystem;

/// File name of the installation configuration file, looked up under
/// `<install-root>/lib/`.
pub const DEFAULT_INSTALL_FILE: &str = "providers.properties";

/// Resolves one concrete provider of an abstract service.
///
/// `find` tries a fixed, ordered sequence of discovery strategies and stops
/// at the first success:
///
/// 1. provider registry of the thread's ambient [context loader](crate::context)
/// 2. provider registry of this finder's defining loader
/// 3. installation properties file (`<install-root>/lib/providers.properties`)
/// 4. process-level configuration value keyed by the factory id
/// 5. module-system resource `services/<factory-id>` (best-effort)
/// 6. the caller-supplied fallback implementation name, if any
///
/// A failing strategy abstains and the chain proceeds; only exhaustion with
/// no fallback is a hard failure — with one deliberate asymmetry: when
/// explicit configuration (strategy 3 or 4) names an implementation, failure
/// to construct it is surfaced instead of masked.
///
/// The finder is stateless beyond its collaborators and resolves fresh on
/// each call; concurrent callers need no coordination.
pub struct Finder {
    defining: Arc<dyn Loader>,
    config: Arc<dyn ConfigSource>,
    modules: Option<Arc<dyn ModuleSystem>>,
    install_file: String,
}

impl Finder {
    /// Finder over the process-wide [defining scope](defining_loader) and the
    /// process environment, with no module system.
    pub fn new() -> Self {
        Self {
            defining: defining_loader(),
            config: Arc::new(ProcessEnv::new()),
            modules: None,
            install_file: DEFAULT_INSTALL_FILE.to_string(),
        }
    }

    pub fn with_defining_loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.defining = loader;
        self
    }

    pub fn with_config(mut self, config: Arc<dyn ConfigSource>) -> Self {
        self.config = config;
        self
    }

    pub fn with_module_system(mut self, modules: Arc<dyn ModuleSystem>) -> Self {
        self.modules = Some(modules);
        self
    }

    pub fn with_install_file(mut self, name: impl Into<String>) -> Self {
        self.install_file = name.into();
        self
    }

    /// Resolve one provider of `S` for `factory_id`.
    ///
    /// `fallback` is an implementation name used only when every discovery
    /// strategy abstains; `None` means exhaustion fails with
    /// [`FindError::NotFound`].
    pub fn find<S: ?Sized + Send + 'static>(
        &self,
        factory_id: &str,
        fallback: Option<&str>,
    ) -> Result<Box<S>, FindError> {
        let service = ServiceKey::of::<S>();
        // Ambient loader is captured once and used for the whole call.
        let context = current_context_loader();

        if let Some(loader) = &context {
            if let Some(instance) = first_provider(loader.as_ref(), &service, factory_id) {
                return downcast(instance);
            }
        }

        if let Some(instance) = first_provider(self.defining.as_ref(), &service, factory_id) {
            return downcast(instance);
        }

        if let Some(instance) = self.from_install_file(context.as_ref(), factory_id)? {
            return downcast(instance);
        }

        if let Some(instance) = self.from_process_value(context.as_ref(), factory_id)? {
            return downcast(instance);
        }

        if let Some(instance) = self.from_module_resource(factory_id) {
            return downcast(instance);
        }

        match fallback {
            Some(type_name) => {
                tracing::debug!(
                    "no provider of {} discovered, using fallback {}",
                    factory_id,
                    type_name
                );
                downcast(instantiate(type_name, context.as_ref(), &self.defining)?)
            }
            None => Err(FindError::NotFound(factory_id.to_string())),
        }
    }

    /// Strategy 3: `<install-root>/lib/<install-file>` properties lookup.
    /// Missing root, unreadable file, or absent key abstain; an entry is
    /// explicit configuration and its instantiation errors surface.
    fn from_install_file(
        &self,
        context: Option<&Arc<dyn Loader>>,
        factory_id: &str,
    ) -> Result<Option<AnyInstance>, FindError> {
        let Some(root) = self.config.install_root() else {
            return Ok(None);
        };
        let path = root.join("lib").join(&self.install_file);
        let entries = match props::load(&path) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!("failed to read {}: {}", path.display(), err);
                return Ok(None);
            }
        };
        let Some(type_name) = entries.get(factory_id) else {
            return Ok(None);
        };
        instantiate(type_name, context, &self.defining).map(Some)
    }

    /// Strategy 4: process-level named value. An unreadable value abstains;
    /// a present, non-empty value is explicit configuration and its
    /// instantiation errors surface.
    fn from_process_value(
        &self,
        context: Option<&Arc<dyn Loader>>,
        factory_id: &str,
    ) -> Result<Option<AnyInstance>, FindError> {
        let value = match self.config.value(factory_id) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("unable to read configuration value {}: {}", factory_id, err);
                return Ok(None);
            }
        };
        match value {
            Some(type_name) if !type_name.is_empty() => {
                instantiate(&type_name, context, &self.defining).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Strategy 5: first line of the module resource `services/<factory-id>`,
    /// instantiated via the module loader. Best-effort by contract: every
    /// failure, including instantiation, abstains.
    fn from_module_resource(&self, factory_id: &str) -> Option<AnyInstance> {
        let modules = self.modules.as_ref()?;
        let loader = modules.service_loader()?;
        let path = format!("{SERVICES_DIR}/{factory_id}");
        let text = match loader.resource(&path) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(err) => {
                tracing::debug!("failed to read module resource {}: {}", path, err);
                return None;
            }
        };
        let type_name = text.lines().next().map(str::trim).unwrap_or_default();
        if type_name.is_empty() {
            return None;
        }
        match instantiate(type_name, Some(&loader), &self.defining) {
            Ok(instance) => Some(instance),
            Err(err) => {
                tracing::debug!(
                    "module resource {} names {} but it did not resolve: {}",
                    path,
                    type_name,
                    err
                );
                None
            }
        }
    }
}

impl Default for Finder {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry lookup for strategies 1 and 2: first registered provider of the
/// service, constructed. Enumeration errors and a failing first constructor
/// are logged at `debug` and abstain.
fn first_provider(
    loader: &dyn Loader,
    service: &ServiceKey,
    factory_id: &str,
) -> Option<AnyInstance> {
    let ctors = match loader.providers(service) {
        Ok(ctors) => ctors,
        Err(err) => {
            tracing::debug!(
                "failed to enumerate providers of {} in loader {}: {}",
                factory_id,
                loader.name(),
                err
            );
            return None;
        }
    };
    let ctor = ctors.first()?;
    match ctor() {
        Ok(instance) => Some(instance),
        Err(err) => {
            tracing::debug!(
                "provider of {} from loader {} failed to construct: {}",
                factory_id,
                loader.name(),
                err
            );
            None
        }
    }
}

/// Resolve with a default [`Finder`]: process-wide defining scope, process
/// environment, no module system.
pub fn find<S: ?Sized + Send + 'static>(
    factory_id: &str,
    fallback: Option<&str>,
) -> Result<Box<S>, FindError> {
    Finder::new().find::<S>(factory_id, fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapSource;
    use crate::context::with_context_loader;
    use crate::loader::StaticLoader;

    const FACTORY_ID: &str = "transport.factory";

    trait Transport: Send {
        fn kind(&self) -> &'static str;
    }

    struct Tcp;
    impl Transport for Tcp {
        fn kind(&self) -> &'static str {
            "tcp"
        }
    }

    struct Udp;
    impl Transport for Udp {
        fn kind(&self) -> &'static str {
            "udp"
        }
    }

    struct InProc;
    impl Transport for InProc {
        fn kind(&self) -> &'static str {
            "inproc"
        }
    }

    struct FixedModules(Option<Arc<dyn Loader>>);
    impl ModuleSystem for FixedModules {
        fn service_loader(&self) -> Option<Arc<dyn Loader>> {
            self.0.clone()
        }
    }

    fn empty_finder() -> Finder {
        Finder::new()
            .with_defining_loader(Arc::new(StaticLoader::new("defining")))
            .with_config(Arc::new(MapSource::new()))
    }

    /// Defining loader with the stock named constructors used across tests.
    fn defining_with_names() -> Arc<StaticLoader> {
        let defining = Arc::new(StaticLoader::new("defining"));
        defining.define::<dyn Transport, _>("demo::Udp", || Box::new(Udp));
        defining.define::<dyn Transport, _>("demo::InProc", || Box::new(InProc));
        defining
            .define_fallible::<dyn Transport, _>("demo::Broken", || Err("socket refused".into()));
        defining
    }

    fn install_root(entry: Option<&str>) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("lib");
        std::fs::create_dir_all(&lib).unwrap();
        if let Some(entry) = entry {
            std::fs::write(
                lib.join(DEFAULT_INSTALL_FILE),
                format!("{FACTORY_ID}={entry}\n"),
            )
            .unwrap();
        }
        dir
    }

    #[test]
    fn ambient_registry_wins_over_everything() {
        let ambient = Arc::new(StaticLoader::new("ambient"));
        ambient.provide::<dyn Transport, _>(|| Box::new(Tcp));

        let defining = defining_with_names();
        defining.provide::<dyn Transport, _>(|| Box::new(Udp));

        let root = install_root(Some("demo::InProc"));
        let finder = Finder::new()
            .with_defining_loader(defining)
            .with_config(Arc::new(MapSource::new().with_install_root(root.path())));

        let transport = with_context_loader(ambient, || {
            finder.find::<dyn Transport>(FACTORY_ID, None).unwrap()
        });
        assert_eq!(transport.kind(), "tcp");
    }

    #[test]
    fn defining_registry_when_ambient_has_none() {
        let ambient = Arc::new(StaticLoader::new("ambient"));
        let defining = Arc::new(StaticLoader::new("defining"));
        defining.provide::<dyn Transport, _>(|| Box::new(Udp));

        let finder = Finder::new()
            .with_defining_loader(defining)
            .with_config(Arc::new(MapSource::new()));

        let transport = with_context_loader(ambient, || {
            finder.find::<dyn Transport>(FACTORY_ID, None).unwrap()
        });
        assert_eq!(transport.kind(), "udp");
    }

    #[test]
    fn dangling_ambient_registration_falls_through() {
        let ambient = Arc::new(StaticLoader::new("ambient"));
        ambient.register_name::<dyn Transport>("demo::Unregistered");

        let defining = Arc::new(StaticLoader::new("defining"));
        defining.provide::<dyn Transport, _>(|| Box::new(Udp));

        let finder = Finder::new()
            .with_defining_loader(defining)
            .with_config(Arc::new(MapSource::new()));

        let transport = with_context_loader(ambient, || {
            finder.find::<dyn Transport>(FACTORY_ID, None).unwrap()
        });
        assert_eq!(transport.kind(), "udp");
    }

    #[test]
    fn failing_registry_constructor_falls_through() {
        let ambient = Arc::new(StaticLoader::new("ambient"));
        ambient.provide_fallible::<dyn Transport, _>(|| Err("no carrier".into()));

        let defining = Arc::new(StaticLoader::new("defining"));
        defining.provide::<dyn Transport, _>(|| Box::new(Udp));

        let finder = Finder::new()
            .with_defining_loader(defining)
            .with_config(Arc::new(MapSource::new()));

        let transport = with_context_loader(ambient, || {
            finder.find::<dyn Transport>(FACTORY_ID, None).unwrap()
        });
        assert_eq!(transport.kind(), "udp");
    }

    #[test]
    fn install_file_resolves_named_type() {
        let root = install_root(Some("demo::Udp"));
        let finder = Finder::new()
            .with_defining_loader(defining_with_names())
            .with_config(Arc::new(MapSource::new().with_install_root(root.path())));

        let transport = finder.find::<dyn Transport>(FACTORY_ID, None).unwrap();
        assert_eq!(transport.kind(), "udp");
    }

    #[test]
    fn install_file_unknown_type_fails_not_falls_through() {
        let root = install_root(Some("demo::Nonexistent"));
        let finder = Finder::new()
            .with_defining_loader(defining_with_names())
            .with_config(Arc::new(MapSource::new().with_install_root(root.path())));

        // A fallback is supplied, but the explicitly configured name must
        // surface as a failure rather than fall through to it.
        let err = finder
            .find::<dyn Transport>(FACTORY_ID, Some("demo::InProc"))
            .err().unwrap();
        assert!(matches!(err, FindError::NotFound(name) if name == "demo::Nonexistent"));
    }

    #[test]
    fn install_file_broken_constructor_fails() {
        let root = install_root(Some("demo::Broken"));
        let finder = Finder::new()
            .with_defining_loader(defining_with_names())
            .with_config(Arc::new(MapSource::new().with_install_root(root.path())));

        let err = finder
            .find::<dyn Transport>(FACTORY_ID, Some("demo::InProc"))
            .err().unwrap();
        assert!(
            matches!(err, FindError::Instantiation { ref type_name, .. } if type_name == "demo::Broken")
        );
    }

    #[test]
    fn install_file_without_key_abstains() {
        let root = install_root(None);
        std::fs::write(
            root.path().join("lib").join(DEFAULT_INSTALL_FILE),
            "other.factory=demo::Udp\n",
        )
        .unwrap();
        let finder = Finder::new()
            .with_defining_loader(defining_with_names())
            .with_config(Arc::new(MapSource::new().with_install_root(root.path())));

        let transport = finder
            .find::<dyn Transport>(FACTORY_ID, Some("demo::InProc"))
            .unwrap();
        assert_eq!(transport.kind(), "inproc");
    }

    #[test]
    fn process_value_resolves_named_type() {
        let finder = Finder::new()
            .with_defining_loader(defining_with_names())
            .with_config(Arc::new(MapSource::new().with_value(FACTORY_ID, "demo::Udp")));

        let transport = finder.find::<dyn Transport>(FACTORY_ID, None).unwrap();
        assert_eq!(transport.kind(), "udp");
    }

    #[test]
    fn process_value_broken_constructor_fails() {
        let finder = Finder::new()
            .with_defining_loader(defining_with_names())
            .with_config(Arc::new(
                MapSource::new().with_value(FACTORY_ID, "demo::Broken"),
            ));

        let err = finder
            .find::<dyn Transport>(FACTORY_ID, Some("demo::InProc"))
            .err().unwrap();
        assert!(matches!(err, FindError::Instantiation { .. }));
    }

    #[test]
    fn empty_process_value_abstains() {
        let finder = Finder::new()
            .with_defining_loader(defining_with_names())
            .with_config(Arc::new(MapSource::new().with_value(FACTORY_ID, "")));

        let transport = finder
            .find::<dyn Transport>(FACTORY_ID, Some("demo::InProc"))
            .unwrap();
        assert_eq!(transport.kind(), "inproc");
    }

    #[test]
    fn unreadable_process_value_abstains() {
        let finder = Finder::new()
            .with_defining_loader(defining_with_names())
            .with_config(Arc::new(MapSource::new().with_unreadable(FACTORY_ID)));

        let transport = finder
            .find::<dyn Transport>(FACTORY_ID, Some("demo::InProc"))
            .unwrap();
        assert_eq!(transport.kind(), "inproc");
    }

    #[test]
    fn module_resource_resolves_via_module_loader() {
        let module_loader = Arc::new(StaticLoader::new("modules"));
        module_loader.define::<dyn Transport, _>("demo::Tcp", || Box::new(Tcp));
        module_loader.put_resource(format!("{SERVICES_DIR}/{FACTORY_ID}"), "demo::Tcp\n");

        let finder = empty_finder()
            .with_module_system(Arc::new(FixedModules(Some(module_loader as Arc<dyn Loader>))));

        let transport = finder.find::<dyn Transport>(FACTORY_ID, None).unwrap();
        assert_eq!(transport.kind(), "tcp");
    }

    #[test]
    fn module_resource_failures_are_swallowed() {
        let module_loader = Arc::new(StaticLoader::new("modules"));
        module_loader
            .define_fallible::<dyn Transport, _>("demo::Flaky", || Err("module offline".into()));
        module_loader.put_resource(format!("{SERVICES_DIR}/{FACTORY_ID}"), "demo::Flaky\n");

        let defining = defining_with_names();
        let finder = Finder::new()
            .with_defining_loader(defining)
            .with_config(Arc::new(MapSource::new()))
            .with_module_system(Arc::new(FixedModules(Some(module_loader as Arc<dyn Loader>))));

        let transport = finder
            .find::<dyn Transport>(FACTORY_ID, Some("demo::InProc"))
            .unwrap();
        assert_eq!(transport.kind(), "inproc");
    }

    #[test]
    fn absent_module_system_abstains() {
        let finder = empty_finder().with_module_system(Arc::new(FixedModules(None)));
        let err = finder.find::<dyn Transport>(FACTORY_ID, None).err().unwrap();
        assert!(matches!(err, FindError::NotFound(_)));
    }

    #[test]
    fn fallback_used_only_on_exhaustion() {
        let finder = Finder::new()
            .with_defining_loader(defining_with_names())
            .with_config(Arc::new(MapSource::new()));

        let transport = finder
            .find::<dyn Transport>(FACTORY_ID, Some("demo::InProc"))
            .unwrap();
        assert_eq!(transport.kind(), "inproc");
    }

    #[test]
    fn exhaustion_without_fallback_is_not_found() {
        let err = empty_finder()
            .find::<dyn Transport>(FACTORY_ID, None)
            .err().unwrap();
        assert!(matches!(err, FindError::NotFound(name) if name == FACTORY_ID));
    }

    #[test]
    fn broken_fallback_is_instantiation_error() {
        let finder = Finder::new()
            .with_defining_loader(defining_with_names())
            .with_config(Arc::new(MapSource::new()));

        let err = finder
            .find::<dyn Transport>(FACTORY_ID, Some("demo::Broken"))
            .err().unwrap();
        assert!(matches!(err, FindError::Instantiation { .. }));
    }

    #[test]
    fn repeated_calls_resolve_equivalently() {
        let finder = Finder::new()
            .with_defining_loader(defining_with_names())
            .with_config(Arc::new(MapSource::new().with_value(FACTORY_ID, "demo::Udp")));

        let first = finder.find::<dyn Transport>(FACTORY_ID, None).unwrap();
        let second = finder.find::<dyn Transport>(FACTORY_ID, None).unwrap();
        assert_eq!(first.kind(), second.kind());
    }
}
