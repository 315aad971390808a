use strum_macros::{Display, EnumString};

/// Role picked by the client-side toggle. It is trusted as sent.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Admin,
    #[default]
    Employee,
}
