//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive, so that, for example, a [`SponsorLogin`] cannot be
//! passed where a [`RepositoryOwner`] is expected even though both are `String`
//! under the hood.

use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Correlation identifier minted once per accepted webhook delivery.
///
/// The same value keys the table record and names the committed file, so the
/// two writes can be matched up later even though they are not transactional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SponsorGuid(Uuid);

impl SponsorGuid {
    /// Generates a new random identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`SponsorGuid`] from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SponsorGuid {
    // Lower-case hyphenated form, e.g. `67e55044-10b1-426f-9247-bb680e5fe0c8`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed
// ---------------------------------------------------------------------------

string_id! {
    /// The GitHub handle of the account that started a sponsorship.
    SponsorLogin
}

string_id! {
    /// Owner (user or organisation) half of an `owner/name` repository slug.
    RepositoryOwner
}

string_id! {
    /// Name half of an `owner/name` repository slug.
    RepositoryName
}

string_id! {
    /// A Git branch name (e.g. `"main"`).
    BranchName
}

string_id! {
    /// Name of the table that receives sponsor records (e.g. `"Sponsors"`).
    TableName
}
