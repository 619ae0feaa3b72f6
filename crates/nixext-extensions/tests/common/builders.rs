//! Descriptor builders for creating test fixtures

#![allow(dead_code)]

use nixext_core::types::{ExtensionDescriptor, SourceKind};

/// Fluent builder for [`ExtensionDescriptor`]
pub struct DescriptorBuilder {
    descriptor: ExtensionDescriptor,
}

impl DescriptorBuilder {
    pub fn new(id: &str, source: SourceKind) -> Self {
        Self {
            descriptor: ExtensionDescriptor::new(id, source),
        }
    }

    /// Literal URL source
    pub fn url(id: &str, url: &str) -> Self {
        Self::new(id, SourceKind::Url).with_url(url)
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.descriptor.name = Some(name.to_string());
        self
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.descriptor.url = Some(url.to_string());
        self
    }

    pub fn with_condition(mut self, condition: &str) -> Self {
        self.descriptor.condition = Some(condition.to_string());
        self
    }

    pub fn with_owner(mut self, owner: &str) -> Self {
        self.descriptor.owner = Some(owner.to_string());
        self
    }

    pub fn with_repo(mut self, repo: &str) -> Self {
        self.descriptor.repo = Some(repo.to_string());
        self
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.descriptor.pattern = Some(pattern.to_string());
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.descriptor.version = Some(version.to_string());
        self
    }

    pub fn build(self) -> ExtensionDescriptor {
        self.descriptor
    }
}
