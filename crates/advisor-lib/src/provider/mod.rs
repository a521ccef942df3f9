//! Provider families
//!
//! Each [`Provider`] variant maps to at most one [`ProviderFamily`]
//! implementation that knows how to aggregate its samples and which
//! rightsizing actions apply to it. Adding a platform means adding a
//! variant and an implementation; there is no runtime registry.

mod kubernetes;

pub use kubernetes::Kubernetes;

use crate::config::EngineConfig;
use crate::models::{AggregatedResource, Allocation, FixAction, MetricSample, Provider};

/// Aggregation and fix generation for one platform family
pub trait ProviderFamily: Send + Sync {
    fn provider(&self) -> Provider;

    /// Summarize every sample of one resource
    fn aggregate(
        &self,
        resource: &str,
        samples: &[&MetricSample],
        ground_truth: Option<&Allocation>,
        config: &EngineConfig,
    ) -> AggregatedResource;

    /// Candidate actions for one aggregated resource
    fn fix_actions(
        &self,
        resource: &AggregatedResource,
        priority: u32,
        config: &EngineConfig,
    ) -> Vec<FixAction>;
}

static KUBERNETES: Kubernetes = Kubernetes;

impl Provider {
    /// Implementation for this provider, `None` when the family is not supported yet
    pub fn family(&self) -> Option<&'static dyn ProviderFamily> {
        match self {
            Provider::Kubernetes => Some(&KUBERNETES),
            Provider::AwsLambda | Provider::AwsEc2 | Provider::Vercel => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.family().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_kubernetes_is_supported() {
        assert!(Provider::Kubernetes.is_supported());
        assert_eq!(
            Provider::Kubernetes.family().map(|f| f.provider()),
            Some(Provider::Kubernetes)
        );
        for provider in [Provider::AwsLambda, Provider::AwsEc2, Provider::Vercel] {
            assert!(!provider.is_supported());
        }
    }
}
