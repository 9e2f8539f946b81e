use std::fmt;

/// Which relationships to the authenticated identity make a repository eligible.
///
/// Always has at least one flag set; `new` refuses the empty combination so an
/// enumeration can never be started without a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affiliation {
    owner: bool,
    collaborator: bool,
    organization_member: bool,
}

impl Affiliation {
    pub fn new(owner: bool, collaborator: bool, organization_member: bool) -> Option<Self> {
        if !owner && !collaborator && !organization_member {
            return None;
        }
        Some(Self {
            owner,
            collaborator,
            organization_member,
        })
    }

    /// Comma-separated value for the `affiliation` query parameter.
    pub fn as_query(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if self.owner {
            parts.push("owner");
        }
        if self.collaborator {
            parts.push("collaborator");
        }
        if self.organization_member {
            parts.push("organization_member");
        }
        parts.join(",")
    }
}

impl fmt::Display for Affiliation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_query())
    }
}
