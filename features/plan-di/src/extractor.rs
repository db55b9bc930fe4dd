use crate::{
    descriptor::DependencyMap,
    signature::{Parameter, ParameterKind, Signature},
    types::ServiceId,
};

/// Extracts which services a provider depends on
///
/// Returns a map from parameter name to the identifier of the required service.
/// Parameters without a usable identifier are left out.
pub trait DependencyExtractor: Send + Sync {
    fn extract(&self, signature: &Signature) -> DependencyMap;
}

/// Uses the names of the parameters as identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct NameExtractor;
impl DependencyExtractor for NameExtractor {
    fn extract(&self, signature: &Signature) -> DependencyMap {
        injectable(signature)
            .map(|param| (param.name.clone(), ServiceId::named(&*param.name)))
            .collect()
    }
}

/// Uses the declared types of the parameters as identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeExtractor;
impl DependencyExtractor for TypeExtractor {
    fn extract(&self, signature: &Signature) -> DependencyMap {
        injectable(signature)
            .filter_map(|param| Some((param.name.clone(), param.declared.clone()?)))
            .collect()
    }
}

fn injectable(signature: &Signature) -> impl Iterator<Item = &Parameter> {
    signature
        .parameters()
        .iter()
        .filter(|param| param.kind == ParameterKind::Keyword && param.name != "self")
}
