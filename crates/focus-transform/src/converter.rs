//! Entry point tying loaded plans to a compiler registry.

use focus_model::{ConversionPlan, ProviderPlans};

use crate::error::{ConvertError, Result};
use crate::graph::DependencyGraph;
use crate::plan::CompiledPlan;
use crate::registry::RuleRegistry;

/// Loaded provider plans plus the registry used to compile them.
#[derive(Debug, Clone)]
pub struct FocusConverter {
    plans: ProviderPlans,
    registry: RuleRegistry,
}

impl FocusConverter {
    pub fn new(plans: ProviderPlans, registry: RuleRegistry) -> Self {
        Self { plans, registry }
    }

    /// Converter using [`RuleRegistry::standard`].
    pub fn with_standard_registry(plans: ProviderPlans) -> Self {
        Self::new(plans, RuleRegistry::standard())
    }

    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.plans.keys().map(String::as_str)
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn plan(&self, provider: &str) -> Result<&ConversionPlan> {
        self.plans
            .get(provider)
            .ok_or_else(|| ConvertError::UnknownProvider {
                provider: provider.to_string(),
            })
    }

    /// Compile the provider's plan.
    pub fn prepare(&self, provider: &str) -> Result<CompiledPlan> {
        CompiledPlan::build(self.plan(provider)?, &self.registry)
    }

    /// Column dependency graph of the provider's plan.
    pub fn explain(&self, provider: &str) -> Result<DependencyGraph> {
        Ok(DependencyGraph::from_plan(self.plan(provider)?))
    }
}
