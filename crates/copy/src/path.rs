//! Fully-qualified instance paths.
//!
//! An instance path is `domain/ns.../class/instance`. The namespace part
//! between the domain and the class is kept relative to the domain so that a
//! copy can re-root it under another domain.

use std::fmt;

use crate::error::CopyError;

/// A parsed `domain/ns.../class/instance` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstancePath {
    pub domain: String,
    /// Namespace path below the domain; empty when the class sits directly
    /// in the domain namespace.
    pub namespace: String,
    pub class: String,
    pub instance: String,
}

impl InstancePath {
    pub fn parse(fqname: &str) -> Result<Self, CopyError> {
        let trimmed = fqname.trim_start_matches('/');
        let segments: Vec<&str> = trimmed.split('/').collect();
        if segments.len() < 3 {
            return Err(CopyError::InvalidPath {
                fqname: fqname.to_string(),
                reason: "expected domain/namespace/class/instance".to_string(),
            });
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(CopyError::InvalidPath {
                fqname: fqname.to_string(),
                reason: "empty path segment".to_string(),
            });
        }

        let last = segments.len() - 1;
        Ok(Self {
            domain: segments[0].to_string(),
            namespace: segments[1..last - 1].join("/"),
            class: segments[last - 1].to_string(),
            instance: segments[last].to_string(),
        })
    }

    /// Fully-qualified name of the namespace holding the class.
    pub fn namespace_fqname(&self) -> String {
        namespace_fqname(&self.domain, &self.namespace)
    }

    pub fn class_fqname(&self) -> String {
        format!("{}/{}", self.namespace_fqname(), self.class)
    }
}

impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.class_fqname(), self.instance)
    }
}

/// Join a domain and a domain-relative namespace into a namespace fqname.
pub fn namespace_fqname(domain: &str, namespace: &str) -> String {
    let namespace = namespace.trim_matches('/');
    if namespace.is_empty() {
        domain.to_string()
    } else {
        format!("{}/{}", domain, namespace)
    }
}

/// Where a copy should land. `None` fields default from the source path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTarget {
    /// Target domain; `None` keeps the source domain.
    pub domain: Option<String>,
    /// Domain-relative namespace; `None` keeps the source namespace.
    pub namespace: Option<String>,
    /// Instance name; `None` keeps the source instance name.
    pub name: Option<String>,
}

/// A [`CopyTarget`] with its defaults filled in from a source path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub domain: String,
    pub namespace: String,
    pub name: String,
}

impl CopyTarget {
    pub fn resolve(&self, source: &InstancePath) -> ResolvedTarget {
        ResolvedTarget {
            domain: self
                .domain
                .clone()
                .unwrap_or_else(|| source.domain.clone()),
            namespace: self
                .namespace
                .clone()
                .unwrap_or_else(|| source.namespace.clone()),
            name: self.name.clone().unwrap_or_else(|| source.instance.clone()),
        }
    }

    /// True when this target names the source location itself. Domain, name
    /// and namespace compare case-insensitively; unspecified parts count as
    /// the source's.
    pub fn is_source(&self, source: &InstancePath) -> bool {
        let domain = self.domain.as_deref().unwrap_or(&source.domain);
        let name = self.name.as_deref().unwrap_or(&source.instance);
        if !domain.eq_ignore_ascii_case(&source.domain)
            || !name.eq_ignore_ascii_case(&source.instance)
        {
            return false;
        }
        match &self.namespace {
            None => true,
            Some(ns) => ns.trim_matches('/').eq_ignore_ascii_case(&source.namespace),
        }
    }
}

impl ResolvedTarget {
    pub fn namespace_fqname(&self) -> String {
        namespace_fqname(&self.domain, &self.namespace)
    }
}
