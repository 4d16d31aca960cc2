//! Container options and resolution policies.
//!
//! Options are plain data with builder-style setters. They can also be read
//! from the environment (`FLAVOR_PACKAGE`, `FLAVOR_SINGLETON_SCOPE`,
//! `FLAVOR_GUARDS`, `FLAVOR_UNRESOLVED`, `FLAVOR_LOG_LIFECYCLE`) or, with the
//! `config` feature, from JSON and YAML documents.

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::{FlavorError, FlavorResult};

/// When a [`Scope::Singleton`](crate::Scope::Singleton) binding may be
/// applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SingletonScopePolicy {
    /// Whenever the target is a discovered canonical singleton, including
    /// later `inject` calls on that same instance
    #[default]
    DiscoveredTarget,
    /// Only during the `startup()` discovery pass
    DiscoveryPass,
}

/// How guards for annotation kinds missing from a site are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GuardPolicy {
    /// Only guards whose kind is present on the site are evaluated
    #[default]
    Lenient,
    /// Every guard must find its annotation kind on the site
    Strict,
}

/// What happens when an inject-marked site has no eligible binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UnresolvedPolicy {
    /// Leave the site unset
    #[default]
    Skip,
    /// Finish the pass, then report [`FlavorError::UnresolvedSite`]
    Fail,
}

fn parse_error(what: &str, value: &str) -> FlavorError {
    FlavorError::Config(format!("invalid {}: {:?}", what, value))
}

impl FromStr for SingletonScopePolicy {
    type Err = FlavorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discovered_target" | "discovered-target" => Ok(Self::DiscoveredTarget),
            "discovery_pass" | "discovery-pass" => Ok(Self::DiscoveryPass),
            _ => Err(parse_error("singleton scope policy", s)),
        }
    }
}

impl FromStr for GuardPolicy {
    type Err = FlavorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            _ => Err(parse_error("guard policy", s)),
        }
    }
}

impl FromStr for UnresolvedPolicy {
    type Err = FlavorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "fail" => Ok(Self::Fail),
            _ => Err(parse_error("unresolved policy", s)),
        }
    }
}

/// Options of a [`Flavor`](crate::Flavor) container.
///
/// # Examples
///
/// ```rust
/// use flavor_di::{FlavorOptions, GuardPolicy, UnresolvedPolicy};
///
/// let options = FlavorOptions::new()
///     .package("my_app::services")
///     .guards(GuardPolicy::Strict)
///     .unresolved(UnresolvedPolicy::Fail);
///
/// assert_eq!(options.package.as_deref(), Some("my_app::services"));
/// assert!(options.log_lifecycle);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FlavorOptions {
    /// Scan package; `None` means the initializer type's module path
    pub package: Option<String>,
    pub singleton_scope: SingletonScopePolicy,
    pub guards: GuardPolicy,
    pub unresolved: UnresolvedPolicy,
    /// Install the tracing observer that logs service load/shutdown lines
    pub log_lifecycle: bool,
}

impl Default for FlavorOptions {
    fn default() -> Self {
        Self {
            package: None,
            singleton_scope: SingletonScopePolicy::default(),
            guards: GuardPolicy::default(),
            unresolved: UnresolvedPolicy::default(),
            log_lifecycle: true,
        }
    }
}

impl FlavorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn singleton_scope(mut self, policy: SingletonScopePolicy) -> Self {
        self.singleton_scope = policy;
        self
    }

    pub fn guards(mut self, policy: GuardPolicy) -> Self {
        self.guards = policy;
        self
    }

    pub fn unresolved(mut self, policy: UnresolvedPolicy) -> Self {
        self.unresolved = policy;
        self
    }

    pub fn log_lifecycle(mut self, enabled: bool) -> Self {
        self.log_lifecycle = enabled;
        self
    }

    /// Reads options from `FLAVOR_*` environment variables. Unset variables
    /// keep their defaults; malformed values are a [`FlavorError::Config`].
    pub fn from_env() -> FlavorResult<Self> {
        Self::from_env_with_prefix("FLAVOR")
    }

    /// Like [`from_env`](Self::from_env) with a custom variable prefix.
    pub fn from_env_with_prefix(prefix: &str) -> FlavorResult<Self> {
        let var = |key: &str| env::var(format!("{}_{}", prefix.to_uppercase(), key.to_uppercase())).ok();

        let mut options = Self::default();
        if let Some(package) = var("package") {
            options.package = Some(package);
        }
        if let Some(value) = var("singleton_scope") {
            options.singleton_scope = value.parse()?;
        }
        if let Some(value) = var("guards") {
            options.guards = value.parse()?;
        }
        if let Some(value) = var("unresolved") {
            options.unresolved = value.parse()?;
        }
        if let Some(value) = var("log_lifecycle") {
            options.log_lifecycle = value
                .parse::<bool>()
                .map_err(|_| parse_error("log_lifecycle flag", &value))?;
        }
        Ok(options)
    }

    /// Parses options from a JSON document.
    #[cfg(feature = "config")]
    pub fn from_json_str(json: &str) -> FlavorResult<Self> {
        serde_json::from_str(json).map_err(|e| FlavorError::Config(e.to_string()))
    }

    /// Parses options from a YAML document.
    #[cfg(feature = "config")]
    pub fn from_yaml_str(yaml: &str) -> FlavorResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| FlavorError::Config(e.to_string()))
    }
}

impl fmt::Display for FlavorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "package={} singleton_scope={:?} guards={:?} unresolved={:?}",
            self.package.as_deref().unwrap_or("<initializer>"),
            self.singleton_scope,
            self.guards,
            self.unresolved
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parsing() {
        assert_eq!("strict".parse::<GuardPolicy>().unwrap(), GuardPolicy::Strict);
        assert_eq!(" Lenient ".parse::<GuardPolicy>().unwrap(), GuardPolicy::Lenient);
        assert_eq!(
            "discovery-pass".parse::<SingletonScopePolicy>().unwrap(),
            SingletonScopePolicy::DiscoveryPass
        );
        assert_eq!("FAIL".parse::<UnresolvedPolicy>().unwrap(), UnresolvedPolicy::Fail);
        assert!(matches!(
            "sometimes".parse::<UnresolvedPolicy>(),
            Err(FlavorError::Config(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let options = FlavorOptions::default();
        assert_eq!(options.package, None);
        assert_eq!(options.singleton_scope, SingletonScopePolicy::DiscoveredTarget);
        assert_eq!(options.guards, GuardPolicy::Lenient);
        assert_eq!(options.unresolved, UnresolvedPolicy::Skip);
        assert!(options.log_lifecycle);
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_json_and_yaml() {
        let json = FlavorOptions::from_json_str(r#"{"package":"app","guards":"strict"}"#).unwrap();
        assert_eq!(json.package.as_deref(), Some("app"));
        assert_eq!(json.guards, GuardPolicy::Strict);
        assert!(json.log_lifecycle);

        let yaml = FlavorOptions::from_yaml_str("unresolved: fail\nlog_lifecycle: false\n").unwrap();
        assert_eq!(yaml.unresolved, UnresolvedPolicy::Fail);
        assert!(!yaml.log_lifecycle);

        assert!(FlavorOptions::from_json_str("{\"guards\": 3}").is_err());
    }
}
