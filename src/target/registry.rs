//! Named target storage.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use super::{RegistryError, WebhookTarget};

/// Counts reported by [`Registry::summary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistrySummary {
    /// Registered targets
    pub total: usize,
    /// Enabled targets
    pub active: usize,
    /// Disabled targets
    pub disabled: usize,
}

/// Holds every known target, keyed by name.
///
/// Populated once at startup through `&mut self`, then wrapped in an
/// [`Arc`] and shared with the dispatcher. Once shared it can no longer be
/// mutated, so lookups need no locking.
///
/// Targets are kept in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    targets: Vec<Arc<WebhookTarget>>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry from a sequence of targets.
    ///
    /// # Errors
    ///
    /// Fails on the first target [`register`](Self::register) rejects.
    pub fn from_targets(
        targets: impl IntoIterator<Item = WebhookTarget>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for target in targets {
            registry.register(target)?;
        }
        Ok(registry)
    }

    /// Validates and stores a target.
    ///
    /// Registering an identical target under an existing name is a no-op
    /// that returns the stored instance.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidConfiguration`] if the target fails
    /// validation, or if its name is taken by a target with different
    /// settings.
    pub fn register(&mut self, target: WebhookTarget) -> Result<Arc<WebhookTarget>, RegistryError> {
        target.validate()?;

        if let Some(&index) = self.by_name.get(target.name()) {
            let existing = &self.targets[index];
            if **existing == target {
                return Ok(Arc::clone(existing));
            }
            return Err(RegistryError::invalid(
                target.name(),
                "already registered with different settings",
            ));
        }

        tracing::debug!(
            target = target.name(),
            url = %target.url(),
            method = %target.method(),
            enabled = target.is_enabled(),
            "Registered webhook target"
        );

        let target = Arc::new(target);
        self.by_name
            .insert(target.name().to_string(), self.targets.len());
        self.targets.push(Arc::clone(&target));
        Ok(target)
    }

    /// Looks up a target by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownTarget`] if no such target exists.
    pub fn resolve(&self, name: &str) -> Result<Arc<WebhookTarget>, RegistryError> {
        self.by_name
            .get(name)
            .map(|&index| Arc::clone(&self.targets[index]))
            .ok_or_else(|| RegistryError::UnknownTarget(name.to_string()))
    }

    /// All targets in registration order.
    #[must_use]
    pub fn list_all(&self) -> &[Arc<WebhookTarget>] {
        &self.targets
    }

    /// Enabled targets in registration order.
    pub fn active(&self) -> impl Iterator<Item = &Arc<WebhookTarget>> {
        self.targets.iter().filter(|t| t.is_enabled())
    }

    /// Number of registered targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns true if no targets are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Total / active / disabled counts.
    #[must_use]
    pub fn summary(&self) -> RegistrySummary {
        let active = self.active().count();
        RegistrySummary {
            total: self.targets.len(),
            active,
            disabled: self.targets.len() - active,
        }
    }
}
