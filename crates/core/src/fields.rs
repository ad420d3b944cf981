//! The typed session field model and its shallow patch.
//!
//! Fields are grouped by the step that owns them. Shared steps (profile
//! basics, commission) write into [`SessionFields`] directly; the
//! role-specific steps write into [`RoleFields`], a tagged union that
//! keeps an influencer step from silently writing into a brand session
//! and vice versa.
//!
//! [`SessionPatch`] is the wire-level shallow patch: every field
//! optional, camelCase, later patches overwriting earlier ones per
//! field. It is the shape exchanged with the step-log endpoints and
//! replayed from the remote log on reconciliation.

use serde::{Deserialize, Serialize};

use crate::documents::DocumentHandle;
use crate::error::CoreError;
use crate::roles::UserRole;

// ---------------------------------------------------------------------------
// Field groups
// ---------------------------------------------------------------------------

/// Social media links collected from influencers. Replaced wholesale by
/// patches (shallow merge semantics stop at the top-level key).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiktok: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

impl SocialLinks {
    /// Whether at least one link is present and non-empty.
    pub fn any(&self) -> bool {
        [&self.youtube, &self.tiktok, &self.instagram]
            .into_iter()
            .any(|l| l.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

/// Step 1: profile basics, shared by both roles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileBasics {
    pub name: String,
    pub display_name: String,
    pub country: String,
    pub phone: String,
    pub phone_verified: bool,
    pub preferred_language: String,
    pub marketing_opt_in: bool,
}

impl Default for ProfileBasics {
    fn default() -> Self {
        Self {
            name: String::new(),
            display_name: String::new(),
            country: String::new(),
            phone: String::new(),
            phone_verified: false,
            preferred_language: "en".to_string(),
            marketing_opt_in: false,
        }
    }
}

/// Step 2A: influencer profile details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InfluencerProfile {
    pub social_links: SocialLinks,
    pub audience_size: String,
    pub niche_tags: Vec<String>,
    pub bio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<DocumentHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<DocumentHandle>,
}

/// Step 2B: brand profile details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandProfile {
    pub legal_entity_name: String,
    pub trade_name: String,
    pub website: String,
    pub support_email: String,
    pub business_address: String,
    pub business_phone: String,
    pub tax_country: String,
}

/// Step 3A: influencer KYC document slots and payout details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InfluencerVerification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_document: Option<DocumentHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selfie_photo: Option<DocumentHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_of_address: Option<DocumentHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_statement: Option<DocumentHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account_holder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<String>,
}

/// Step 3B: brand KYB document slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandVerification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_registration: Option<DocumentHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retail_permit: Option<DocumentHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account_book: Option<DocumentHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized_rep_id: Option<DocumentHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_id: Option<String>,
}

/// Step 4: commission preferences, shared by both roles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommissionSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_commission: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_commission: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_commission: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Role-specific field groups. A session holds exactly one variant,
/// fixed by its role; patches carrying the other role's fields are
/// rejected (strict apply) or skipped (lenient apply).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleFields {
    Influencer {
        profile: InfluencerProfile,
        verification: InfluencerVerification,
    },
    Brand {
        profile: BrandProfile,
        verification: BrandVerification,
    },
}

impl RoleFields {
    /// Fresh role-specific fields for a role.
    pub fn for_role(role: UserRole) -> Self {
        match role {
            UserRole::Influencer => Self::Influencer {
                profile: InfluencerProfile::default(),
                verification: InfluencerVerification::default(),
            },
            UserRole::Brand => Self::Brand {
                profile: BrandProfile::default(),
                verification: BrandVerification::default(),
            },
        }
    }

    /// The role this variant belongs to.
    pub fn role(&self) -> UserRole {
        match self {
            Self::Influencer { .. } => UserRole::Influencer,
            Self::Brand { .. } => UserRole::Brand,
        }
    }
}

/// The complete field bag for one onboarding session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFields {
    pub basics: ProfileBasics,
    pub commission: CommissionSettings,
    /// Demo flow only: set by the inline document-upload step.
    pub documents_complete: bool,
    pub role_fields: RoleFields,
}

impl SessionFields {
    /// Empty fields for a fresh session of the given role.
    pub fn for_role(role: UserRole) -> Self {
        Self {
            basics: ProfileBasics::default(),
            commission: CommissionSettings::default(),
            documents_complete: false,
            role_fields: RoleFields::for_role(role),
        }
    }

    /// The role these fields belong to.
    pub fn role(&self) -> UserRole {
        self.role_fields.role()
    }
}

// ---------------------------------------------------------------------------
// Shallow patch
// ---------------------------------------------------------------------------

/// How to treat a patch that carries fields belonging to the other role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Reject the whole patch with a validation error. Used when a step
    /// submits its own data.
    Strict,
    /// Skip the mismatched fields with a debug log. Used when replaying
    /// a remote step log whose provenance we do not control.
    Lenient,
}

/// A shallow, all-optional patch over [`SessionFields`].
///
/// This is the flat camelCase shape the step endpoints accept and the
/// remote step log stores. `Some` overwrites, `None` leaves the field
/// untouched; nested structures (`socialLinks`) are replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionPatch {
    // Step 1: profile basics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketing_opt_in: Option<bool>,

    // Step 2A: influencer profile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_links: Option<SocialLinks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub niche_tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<DocumentHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<DocumentHandle>,

    // Step 2B: brand profile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_entity_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_country: Option<String>,

    // Step 3A: influencer KYC
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_document: Option<DocumentHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selfie_photo: Option<DocumentHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_of_address: Option<DocumentHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_statement: Option<DocumentHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account_holder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<String>,

    // Step 3B: brand KYB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_registration: Option<DocumentHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retail_permit: Option<DocumentHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account_book: Option<DocumentHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized_rep_id: Option<DocumentHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_id: Option<String>,

    // Step 4: commission
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_commission: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_commission: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_commission: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    // Demo flow: inline document upload step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents_complete: Option<bool>,
}

/// Expands to a `keys()` entry and a merge arm for each patch field.
macro_rules! patch_fields {
    ($($field:ident => $key:literal),+ $(,)?) => {
        impl SessionPatch {
            /// The camelCase wire keys this patch sets. Used by the
            /// navigator to track which fields the user has touched
            /// this session, so a late remote merge does not clobber
            /// fresh local edits.
            pub fn keys(&self) -> Vec<&'static str> {
                let mut keys = Vec::new();
                $(if self.$field.is_some() { keys.push($key); })+
                keys
            }

            /// Whether no field is set.
            pub fn is_empty(&self) -> bool {
                $(self.$field.is_none())&&+
            }

            /// Overlay `later` on top of `self`: every field `later`
            /// sets wins. This is the step-log replay primitive.
            pub fn merge(&mut self, later: SessionPatch) {
                $(if later.$field.is_some() { self.$field = later.$field; })+
            }

            /// Clear every field whose wire key is in `skip`.
            pub fn strip_keys(&mut self, skip: &std::collections::BTreeSet<String>) {
                $(if skip.contains($key) { self.$field = None; })+
            }
        }
    };
}

patch_fields! {
    name => "name",
    display_name => "displayName",
    country => "country",
    phone => "phone",
    phone_verified => "phoneVerified",
    preferred_language => "preferredLanguage",
    marketing_opt_in => "marketingOptIn",
    social_links => "socialLinks",
    audience_size => "audienceSize",
    niche_tags => "nicheTags",
    bio => "bio",
    avatar => "avatar",
    banner => "banner",
    legal_entity_name => "legalEntityName",
    trade_name => "tradeName",
    website => "website",
    support_email => "supportEmail",
    business_address => "businessAddress",
    business_phone => "businessPhone",
    tax_country => "taxCountry",
    id_document => "idDocument",
    selfie_photo => "selfiePhoto",
    proof_of_address => "proofOfAddress",
    bank_statement => "bankStatement",
    bank_account_holder => "bankAccountHolder",
    bank_account => "bankAccount",
    business_registration => "businessRegistration",
    retail_permit => "retailPermit",
    bank_account_book => "bankAccountBook",
    authorized_rep_id => "authorizedRepId",
    business_id => "businessId",
    default_commission => "defaultCommission",
    min_commission => "minCommission",
    max_commission => "maxCommission",
    currency => "currency",
    documents_complete => "documentsComplete",
}

impl SessionPatch {
    /// Whether this patch carries any influencer-only field.
    fn touches_influencer(&self) -> bool {
        self.social_links.is_some()
            || self.audience_size.is_some()
            || self.niche_tags.is_some()
            || self.bio.is_some()
            || self.avatar.is_some()
            || self.banner.is_some()
            || self.id_document.is_some()
            || self.selfie_photo.is_some()
            || self.proof_of_address.is_some()
            || self.bank_statement.is_some()
            || self.bank_account_holder.is_some()
            || self.bank_account.is_some()
    }

    /// Whether this patch carries any brand-only field.
    fn touches_brand(&self) -> bool {
        self.legal_entity_name.is_some()
            || self.trade_name.is_some()
            || self.website.is_some()
            || self.support_email.is_some()
            || self.business_address.is_some()
            || self.business_phone.is_some()
            || self.tax_country.is_some()
            || self.business_registration.is_some()
            || self.retail_permit.is_some()
            || self.bank_account_book.is_some()
            || self.authorized_rep_id.is_some()
            || self.business_id.is_some()
    }

    /// Apply this patch to `fields`.
    ///
    /// Shared fields always apply. Role-specific fields apply only when
    /// the session's role matches; a mismatch is an error in
    /// [`ApplyMode::Strict`] and a skipped field in
    /// [`ApplyMode::Lenient`].
    pub fn apply_to(&self, fields: &mut SessionFields, mode: ApplyMode) -> Result<(), CoreError> {
        let role = fields.role();
        let mismatch = match role {
            UserRole::Influencer => self.touches_brand(),
            UserRole::Brand => self.touches_influencer(),
        };
        if mismatch {
            match mode {
                ApplyMode::Strict => {
                    return Err(CoreError::Validation(format!(
                        "Patch contains fields that do not belong to role '{}'",
                        role.as_str()
                    )));
                }
                ApplyMode::Lenient => {
                    tracing::debug!(role = role.as_str(), "Skipping fields for the other role");
                }
            }
        }

        // Shared: profile basics
        let b = &mut fields.basics;
        if let Some(v) = &self.name {
            b.name = v.clone();
        }
        if let Some(v) = &self.display_name {
            b.display_name = v.clone();
        }
        if let Some(v) = &self.country {
            b.country = v.clone();
        }
        if let Some(v) = &self.phone {
            b.phone = v.clone();
        }
        if let Some(v) = self.phone_verified {
            b.phone_verified = v;
        }
        if let Some(v) = &self.preferred_language {
            b.preferred_language = v.clone();
        }
        if let Some(v) = self.marketing_opt_in {
            b.marketing_opt_in = v;
        }

        // Shared: commission
        let c = &mut fields.commission;
        if let Some(v) = self.default_commission {
            c.default_commission = Some(v);
        }
        if let Some(v) = self.min_commission {
            c.min_commission = Some(v);
        }
        if let Some(v) = self.max_commission {
            c.max_commission = Some(v);
        }
        if let Some(v) = &self.currency {
            c.currency = Some(v.clone());
        }

        // Demo flow flag
        if let Some(v) = self.documents_complete {
            fields.documents_complete = v;
        }

        // Role-specific
        match &mut fields.role_fields {
            RoleFields::Influencer {
                profile,
                verification,
            } => {
                if let Some(v) = &self.social_links {
                    profile.social_links = v.clone();
                }
                if let Some(v) = &self.audience_size {
                    profile.audience_size = v.clone();
                }
                if let Some(v) = &self.niche_tags {
                    profile.niche_tags = v.clone();
                }
                if let Some(v) = &self.bio {
                    profile.bio = v.clone();
                }
                if let Some(v) = &self.avatar {
                    profile.avatar = Some(v.clone());
                }
                if let Some(v) = &self.banner {
                    profile.banner = Some(v.clone());
                }
                if let Some(v) = &self.id_document {
                    verification.id_document = Some(v.clone());
                }
                if let Some(v) = &self.selfie_photo {
                    verification.selfie_photo = Some(v.clone());
                }
                if let Some(v) = &self.proof_of_address {
                    verification.proof_of_address = Some(v.clone());
                }
                if let Some(v) = &self.bank_statement {
                    verification.bank_statement = Some(v.clone());
                }
                if let Some(v) = &self.bank_account_holder {
                    verification.bank_account_holder = Some(v.clone());
                }
                if let Some(v) = &self.bank_account {
                    verification.bank_account = Some(v.clone());
                }
            }
            RoleFields::Brand {
                profile,
                verification,
            } => {
                if let Some(v) = &self.legal_entity_name {
                    profile.legal_entity_name = v.clone();
                }
                if let Some(v) = &self.trade_name {
                    profile.trade_name = v.clone();
                }
                if let Some(v) = &self.website {
                    profile.website = v.clone();
                }
                if let Some(v) = &self.support_email {
                    profile.support_email = v.clone();
                }
                if let Some(v) = &self.business_address {
                    profile.business_address = v.clone();
                }
                if let Some(v) = &self.business_phone {
                    profile.business_phone = v.clone();
                }
                if let Some(v) = &self.tax_country {
                    profile.tax_country = v.clone();
                }
                if let Some(v) = &self.business_registration {
                    verification.business_registration = Some(v.clone());
                }
                if let Some(v) = &self.retail_permit {
                    verification.retail_permit = Some(v.clone());
                }
                if let Some(v) = &self.bank_account_book {
                    verification.bank_account_book = Some(v.clone());
                }
                if let Some(v) = &self.authorized_rep_id {
                    verification.authorized_rep_id = Some(v.clone());
                }
                if let Some(v) = &self.business_id {
                    verification.business_id = Some(v.clone());
                }
            }
        }

        Ok(())
    }
}

impl SessionFields {
    /// Flatten the current field values into a patch that sets every
    /// populated field. Used to build the full-session payload the
    /// per-step endpoints expect.
    pub fn to_patch(&self) -> SessionPatch {
        let non_empty = |s: &String| -> Option<String> {
            if s.is_empty() {
                None
            } else {
                Some(s.clone())
            }
        };

        let mut patch = SessionPatch {
            name: non_empty(&self.basics.name),
            display_name: non_empty(&self.basics.display_name),
            country: non_empty(&self.basics.country),
            phone: non_empty(&self.basics.phone),
            phone_verified: Some(self.basics.phone_verified),
            preferred_language: non_empty(&self.basics.preferred_language),
            marketing_opt_in: Some(self.basics.marketing_opt_in),
            default_commission: self.commission.default_commission,
            min_commission: self.commission.min_commission,
            max_commission: self.commission.max_commission,
            currency: self.commission.currency.clone(),
            documents_complete: Some(self.documents_complete),
            ..SessionPatch::default()
        };

        match &self.role_fields {
            RoleFields::Influencer {
                profile,
                verification,
            } => {
                patch.social_links = Some(profile.social_links.clone());
                patch.audience_size = non_empty(&profile.audience_size);
                patch.niche_tags = if profile.niche_tags.is_empty() {
                    None
                } else {
                    Some(profile.niche_tags.clone())
                };
                patch.bio = non_empty(&profile.bio);
                patch.avatar = profile.avatar.clone();
                patch.banner = profile.banner.clone();
                patch.id_document = verification.id_document.clone();
                patch.selfie_photo = verification.selfie_photo.clone();
                patch.proof_of_address = verification.proof_of_address.clone();
                patch.bank_statement = verification.bank_statement.clone();
                patch.bank_account_holder = verification.bank_account_holder.clone();
                patch.bank_account = verification.bank_account.clone();
            }
            RoleFields::Brand {
                profile,
                verification,
            } => {
                patch.legal_entity_name = non_empty(&profile.legal_entity_name);
                patch.trade_name = non_empty(&profile.trade_name);
                patch.website = non_empty(&profile.website);
                patch.support_email = non_empty(&profile.support_email);
                patch.business_address = non_empty(&profile.business_address);
                patch.business_phone = non_empty(&profile.business_phone);
                patch.tax_country = non_empty(&profile.tax_country);
                patch.business_registration = verification.business_registration.clone();
                patch.retail_permit = verification.retail_permit.clone();
                patch.bank_account_book = verification.bank_account_book.clone();
                patch.authorized_rep_id = verification.authorized_rep_id.clone();
                patch.business_id = verification.business_id.clone();
            }
        }

        patch
    }
}
