//! User roles for the onboarding flows.
//!
//! Onboarding knows two roles: influencers building curated shops and
//! brands (suppliers) listing products. The onboarding role name and the
//! database role name differ for brands (`brand` on the wire,
//! `supplier` in the `profiles` table), so both mappings live here.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The role a user is onboarding as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Influencer,
    Brand,
}

impl UserRole {
    /// Parse a role string from the database or a query parameter.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "influencer" => Ok(Self::Influencer),
            // "supplier" is the post-onboarding profile role for brands.
            "brand" | "supplier" => Ok(Self::Brand),
            _ => Err(CoreError::Validation(format!(
                "Invalid role '{s}'. Must be one of: influencer, brand"
            ))),
        }
    }

    /// Convert to the onboarding role string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Influencer => "influencer",
            Self::Brand => "brand",
        }
    }

    /// The role name stored in the `profiles` table once onboarding
    /// completes. Brands become suppliers.
    pub fn db_role(&self) -> &'static str {
        match self {
            Self::Influencer => "influencer",
            Self::Brand => "supplier",
        }
    }

    /// The dashboard a user lands on after a successful final submit.
    pub fn redirect_path(&self) -> &'static str {
        match self {
            Self::Influencer => "/dashboard/influencer",
            Self::Brand => "/dashboard/supplier",
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Influencer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_from_str_valid() {
        assert_eq!(
            UserRole::from_str_db("influencer").unwrap(),
            UserRole::Influencer
        );
        assert_eq!(UserRole::from_str_db("brand").unwrap(), UserRole::Brand);
    }

    #[test]
    fn role_from_str_invalid() {
        assert!(UserRole::from_str_db("admin").is_err());
        assert!(UserRole::from_str_db("").is_err());
    }

    #[test]
    fn role_as_str_roundtrip() {
        for role in [UserRole::Influencer, UserRole::Brand] {
            assert_eq!(UserRole::from_str_db(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn supplier_parses_as_brand() {
        assert_eq!(UserRole::from_str_db("supplier").unwrap(), UserRole::Brand);
    }

    #[test]
    fn brand_maps_to_supplier() {
        assert_eq!(UserRole::Brand.db_role(), "supplier");
        assert_eq!(UserRole::Influencer.db_role(), "influencer");
    }

    #[test]
    fn redirect_paths_differ_per_role() {
        assert_eq!(UserRole::Influencer.redirect_path(), "/dashboard/influencer");
        assert_eq!(UserRole::Brand.redirect_path(), "/dashboard/supplier");
    }
}
