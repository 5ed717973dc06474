//! Package identities: idents, descriptors, locators and ranges.
//!
//! A *descriptor* is a dependency request (`node-gyp-build@npm:^4.3.0`); a
//! *locator* is a resolved package (`node-gyp-build@npm:4.8.1`). Both are
//! rendered and parsed in the `ident@range` form used by lockfiles.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use thiserror::Error;

/// Errors raised while parsing identities.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentError {
    /// The string has no `@` separating ident and range/reference.
    #[error("Missing range in '{0}'")]
    MissingRange(String),

    /// The ident part is empty or a scope has no name.
    #[error("Invalid package ident '{0}'")]
    InvalidIdent(String),
}

/// A package name with an optional scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ident {
    /// Scope without the leading `@`.
    pub scope: Option<String>,
    /// Bare package name.
    pub name: String,
}

impl Ident {
    /// Create an unscoped ident.
    pub fn new(name: &str) -> Self {
        Self {
            scope: None,
            name: name.to_string(),
        }
    }

    /// Parse `name` or `@scope/name`.
    ///
    /// # Errors
    ///
    /// Returns [`IdentError::InvalidIdent`] for an empty name or a scope
    /// without a name.
    pub fn parse(s: &str) -> Result<Self, IdentError> {
        let invalid = || IdentError::InvalidIdent(s.to_string());
        if let Some(scoped) = s.strip_prefix('@') {
            let (scope, name) = scoped.split_once('/').ok_or_else(invalid)?;
            if scope.is_empty() || name.is_empty() {
                return Err(invalid());
            }
            Ok(Self {
                scope: Some(scope.to_string()),
                name: name.to_string(),
            })
        } else if s.is_empty() || s.contains('/') {
            Err(invalid())
        } else {
            Ok(Self::new(s))
        }
    }

    /// Filesystem-safe form: `@scope-name` or `name`.
    pub fn slug(&self) -> String {
        match &self.scope {
            Some(scope) => format!("@{scope}-{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Relative directory of the package inside a `node_modules` folder.
    pub fn path(&self) -> std::path::PathBuf {
        match &self.scope {
            Some(scope) => std::path::Path::new(&format!("@{scope}")).join(&self.name),
            None => std::path::PathBuf::from(&self.name),
        }
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "@{scope}/{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Split `ident@rest`, skipping the leading `@` of a scope.
fn split_ident(s: &str) -> Result<(Ident, &str), IdentError> {
    let search_from = usize::from(s.starts_with('@'));
    let at = s[search_from..]
        .find('@')
        .map(|i| i + search_from)
        .ok_or_else(|| IdentError::MissingRange(s.to_string()))?;
    Ok((Ident::parse(&s[..at])?, &s[at + 1..]))
}

/// A dependency request: an ident plus the range it was requested with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Descriptor {
    /// Requested package.
    pub ident: Ident,
    /// Requested range, protocol included (`npm:^4.0.0`).
    pub range: String,
}

impl Descriptor {
    /// Create a descriptor.
    pub fn new(ident: Ident, range: impl Into<String>) -> Self {
        Self {
            ident,
            range: range.into(),
        }
    }

    /// Parse `ident@range`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range or ident is missing.
    pub fn parse(s: &str) -> Result<Self, IdentError> {
        let (ident, range) = split_ident(s)?;
        Ok(Self::new(ident, range))
    }
}

impl std::fmt::Display for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.ident, self.range)
    }
}

/// A resolved package: an ident plus the reference it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Locator {
    /// Resolved package.
    pub ident: Ident,
    /// Resolved reference, protocol included (`npm:4.8.1`).
    pub reference: String,
}

impl Locator {
    /// Create a locator.
    pub fn new(ident: Ident, reference: impl Into<String>) -> Self {
        Self {
            ident,
            reference: reference.into(),
        }
    }

    /// Parse `ident@reference`.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference or ident is missing.
    pub fn parse(s: &str) -> Result<Self, IdentError> {
        let (ident, reference) = split_ident(s)?;
        Ok(Self::new(ident, reference))
    }

    /// Protocol of the reference without the trailing `:`, if any.
    pub fn protocol(&self) -> Option<&str> {
        self.reference.split_once(':').map(|(protocol, _)| protocol)
    }

    /// Hex SHA-512 of the rendered locator.
    pub fn hash(&self) -> String {
        hex::encode(Sha512::digest(self.to_string().as_bytes()))
    }

    /// Filesystem-safe, unique name for this locator.
    ///
    /// `npm:` references with a valid semver version are shortened to the
    /// version; other references are shortened to their protocol.
    ///
    /// # Example
    ///
    /// ```
    /// use prebind_schema::{Ident, Locator};
    ///
    /// let locator = Locator::new(Ident::parse("@serialport/bindings-cpp").unwrap(), "npm:10.8.0");
    /// assert!(locator.slug().starts_with("@serialport-bindings-cpp-10.8.0-"));
    /// ```
    pub fn slug(&self) -> String {
        let (protocol, rest) = match self.reference.split_once(':') {
            Some((protocol, rest)) => (protocol, rest),
            None => ("exotic", self.reference.as_str()),
        };
        let human = if protocol == "npm" && semver::Version::parse(rest).is_ok() {
            rest
        } else {
            protocol
        };
        let hash = self.hash();
        format!("{}-{human}-{}", self.ident.slug(), &hash[..10])
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.ident, self.reference)
    }
}

/// A structured range: `protocol` `source#` `selector` `::params`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    /// Protocol including the trailing `:` (`static-prebuild:`).
    pub protocol: Option<String>,
    /// Where the range came from, rendered before `#`.
    pub source: Option<String>,
    /// The selector proper.
    pub selector: String,
    /// Opaque query parameters, rendered after `::`.
    pub params: Option<String>,
}

impl Range {
    /// Parse a rendered range. Never fails; the whole string becomes the
    /// selector when no structure is found.
    pub fn parse(s: &str) -> Self {
        let (protocol, rest) = match s.find(':') {
            Some(i) if !s[..i].contains(['#', '@']) => (Some(s[..=i].to_string()), &s[i + 1..]),
            _ => (None, s),
        };
        let (rest, params) = match rest.split_once("::") {
            Some((rest, params)) => (rest, Some(params.to_string())),
            None => (rest, None),
        };
        let (source, selector) = match rest.split_once('#') {
            Some((source, selector)) => (Some(decode(source)), decode(selector)),
            None => (None, decode(rest)),
        };
        Self {
            protocol,
            source,
            selector,
            params,
        }
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(protocol) = &self.protocol {
            write!(f, "{protocol}")?;
        }
        if let Some(source) = &self.source {
            write!(f, "{}#", encode(source))?;
        }
        write!(f, "{}", encode(&self.selector))?;
        if let Some(params) = &self.params {
            write!(f, "::{params}")?;
        }
        Ok(())
    }
}

fn encode(s: &str) -> String {
    s.replace('%', "%25").replace(':', "%3A").replace('#', "%23")
}

fn decode(s: &str) -> String {
    s.replace("%3A", ":").replace("%23", "#").replace("%25", "%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ident_parse_and_display() {
        let plain = Ident::parse("node-gyp-build").unwrap();
        assert_eq!(plain.scope, None);
        assert_eq!(plain.to_string(), "node-gyp-build");

        let scoped = Ident::parse("@serialport/bindings-cpp").unwrap();
        assert_eq!(scoped.scope.as_deref(), Some("serialport"));
        assert_eq!(scoped.name, "bindings-cpp");
        assert_eq!(scoped.to_string(), "@serialport/bindings-cpp");
        assert_eq!(scoped.slug(), "@serialport-bindings-cpp");
        assert_eq!(
            scoped.path(),
            std::path::Path::new("@serialport").join("bindings-cpp")
        );

        assert!(Ident::parse("").is_err());
        assert!(Ident::parse("@scope").is_err());
        assert!(Ident::parse("@/name").is_err());
        assert!(Ident::parse("a/b").is_err());
    }

    #[test]
    fn test_locator_parse_scoped() {
        let locator = Locator::parse("@serialport/bindings-cpp@npm:10.8.0").unwrap();
        assert_eq!(locator.ident.to_string(), "@serialport/bindings-cpp");
        assert_eq!(locator.reference, "npm:10.8.0");
        assert_eq!(locator.protocol(), Some("npm"));
        assert_eq!(locator.to_string(), "@serialport/bindings-cpp@npm:10.8.0");

        assert!(Locator::parse("no-reference").is_err());
    }

    #[test]
    fn test_slug_shapes() {
        let npm = Locator::parse("leveldown@npm:6.1.1").unwrap();
        let slug = npm.slug();
        assert!(slug.starts_with("leveldown-6.1.1-"));
        assert_eq!(slug.len(), "leveldown-6.1.1-".len() + 10);

        let exotic = Locator::parse("node-gyp-build@static-prebuild:x#y").unwrap();
        assert!(exotic.slug().starts_with("node-gyp-build-static-prebuild-"));

        let range = Locator::parse("leveldown@npm:^6.0.0").unwrap();
        assert!(range.slug().starts_with("leveldown-npm-"));
    }

    #[test]
    fn test_slug_is_stable_and_distinct() {
        let a = Locator::parse("node-gyp-build@static-prebuild:a").unwrap();
        let b = Locator::parse("node-gyp-build@static-prebuild:b").unwrap();
        assert_eq!(a.slug(), a.clone().slug());
        assert_ne!(a.slug(), b.slug());
    }

    #[test]
    fn test_range_render_and_parse() {
        let range = Range {
            protocol: Some("static-prebuild:".to_string()),
            source: Some("node-gyp-build@npm:^4.3.0".to_string()),
            selector: "node-gyp-build<leveldown@npm:6.1.1>".to_string(),
            params: None,
        };
        let rendered = range.to_string();
        assert_eq!(
            rendered,
            "static-prebuild:node-gyp-build@npm%3A^4.3.0#node-gyp-build<leveldown@npm%3A6.1.1>"
        );
        assert_eq!(Range::parse(&rendered), range);
    }

    #[test]
    fn test_range_without_protocol() {
        let range = Range::parse("^4.0.0");
        assert_eq!(range.protocol, None);
        assert_eq!(range.selector, "^4.0.0");
        assert_eq!(range.to_string(), "^4.0.0");
    }
}
