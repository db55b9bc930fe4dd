use std::borrow::Cow;

use crate::types::ServiceId;

/// How a parameter binds its argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Bound to exactly one dependency by name
    Keyword,
    /// Catches any remaining positional values - never injected
    Variadic,
    /// Catches any remaining keyword values - never injected
    KeywordCatchAll,
}

/// One declared parameter of a provider
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: Cow<'static, str>,
    /// The service identifier the parameter is declared with, if any
    pub declared: Option<ServiceId>,
    pub kind: ParameterKind,
}

/// Ahead-of-time description of what a provider takes
///
/// Extractors inspect this instead of reflecting on the provider itself.
///
/// ```rust
/// use plan_di::Signature;
///
/// struct Config;
///
/// let signature = Signature::new()
///     .param::<Config>("config")
///     .untyped("label")
///     .variadic("rest");
///
/// assert_eq!(signature.len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Signature {
    parameters: Vec<Parameter>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// A keyword parameter declared with the type `T`
    pub fn param<T: 'static + ?Sized>(self, name: impl Into<Cow<'static, str>>) -> Self {
        self.param_id(name, ServiceId::of::<T>())
    }

    /// A keyword parameter declared with an arbitrary identifier
    pub fn param_id(self, name: impl Into<Cow<'static, str>>, id: ServiceId) -> Self {
        self.push(name, Some(id), ParameterKind::Keyword)
    }

    /// A keyword parameter without a declared type
    pub fn untyped(self, name: impl Into<Cow<'static, str>>) -> Self {
        self.push(name, None, ParameterKind::Keyword)
    }

    pub fn variadic(self, name: impl Into<Cow<'static, str>>) -> Self {
        self.push(name, None, ParameterKind::Variadic)
    }

    pub fn keyword_catch_all(self, name: impl Into<Cow<'static, str>>) -> Self {
        self.push(name, None, ParameterKind::KeywordCatchAll)
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    fn push(
        mut self,
        name: impl Into<Cow<'static, str>>,
        declared: Option<ServiceId>,
        kind: ParameterKind,
    ) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            declared,
            kind,
        });
        self
    }
}
