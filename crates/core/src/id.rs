// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifiers for batches and pipelines

/// Returns a string slice truncated to at most `n` characters.
pub fn short(s: &str, n: usize) -> &str {
    if s.len() <= n {
        s
    } else {
        &s[..n]
    }
}

/// Define a prefixed newtype ID over `SmolStr`.
///
/// IDs look like `{prefix}{nanoid}`: a 4 character prefix and a 19 character
/// random suffix, 23 bytes in all, so they stay inline in a `SmolStr`.
///
/// ```ignore
/// define_id! {
///     /// Doc comment for the ID type.
///     pub struct BatchId("bat-");
/// }
/// ```
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(smol_str::SmolStr);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new() -> Self {
                Self(smol_str::format_smolstr!("{}{}", Self::PREFIX, nanoid::nanoid!(19)))
            }

            /// Wrap an existing id string as-is.
            pub fn from_string(id: impl Into<smol_str::SmolStr>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The random part; the whole id if the prefix is missing.
            pub fn suffix(&self) -> &str {
                self.0.strip_prefix(Self::PREFIX).unwrap_or(&self.0)
            }

            pub fn short(&self, n: usize) -> &str {
                $crate::id::short(self.suffix(), n)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

crate::define_id! {
    /// Identifier assigned to a command batch when it is built.
    pub struct BatchId("bat-");
}

crate::define_id! {
    /// Identifier assigned to each pipeline bound to the interpreter session.
    pub struct PipelineId("pip-");
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
