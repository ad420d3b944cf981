//! Onboarding wizard constants, step definitions, and validation.
//!
//! Defines the step catalogue for the standard and demo flows, the
//! session status enumeration, the navigation gate, and the per-step
//! field validation used before a step may be completed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::CoreError;
use crate::fields::{RoleFields, SessionFields};
use crate::roles::UserRole;

// ---------------------------------------------------------------------------
// Flow and status
// ---------------------------------------------------------------------------

/// Which wizard variant a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// The full wizard with server persistence and real verification.
    Standard,
    /// The walkthrough variant: same step shape, inline document
    /// checklist instead of real uploads, no server persistence.
    Demo,
}

impl Default for Flow {
    fn default() -> Self {
        Self::Standard
    }
}

/// Status values for a server-side onboarding record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStatus {
    Draft,
    Completed,
}

impl OnboardingStatus {
    /// Parse a status string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "draft" => Ok(Self::Draft),
            "completed" => Ok(Self::Completed),
            _ => Err(CoreError::Validation(format!(
                "Invalid onboarding status '{s}'. Must be one of: draft, completed"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Completed => "completed",
        }
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Total number of steps in the wizard.
pub const TOTAL_STEPS: u8 = 5;

/// Minimum step number (1-based).
pub const MIN_STEP: u8 = 1;

/// Maximum step number (1-based).
pub const MAX_STEP: u8 = 5;

/// A display entry in the step sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDescriptor {
    pub number: u8,
    pub title: &'static str,
    pub description: &'static str,
}

/// The step sequence for a flow and role.
///
/// Both flows share the five-step shape; titles and descriptions vary
/// by role for the role-specific steps, and the demo flow swaps the
/// verification step for an inline document checklist.
pub fn step_sequence_for(flow: Flow, role: UserRole) -> [StepDescriptor; TOTAL_STEPS as usize] {
    let (step2_desc, step3_title, step3_desc) = match (flow, role) {
        (Flow::Standard, UserRole::Influencer) => (
            "Social links, audience, and niche",
            "Verification",
            "Identity documents and payout details",
        ),
        (Flow::Standard, UserRole::Brand) => (
            "Business details and contacts",
            "Verification",
            "Business registration and bank documents",
        ),
        (Flow::Demo, UserRole::Influencer) => (
            "Social links, audience, and niche",
            "Document Upload",
            "Checklist of documents to prepare",
        ),
        (Flow::Demo, UserRole::Brand) => (
            "Business details and contacts",
            "Document Upload",
            "Checklist of documents to prepare",
        ),
    };
    let (step5_title, step5_desc) = match flow {
        Flow::Standard => ("Review", "Review and submit your application"),
        Flow::Demo => ("Complete", "You are ready to go"),
    };

    [
        StepDescriptor {
            number: 1,
            title: "Profile Basics",
            description: "Name, country, and phone verification",
        },
        StepDescriptor {
            number: 2,
            title: "Profile Details",
            description: step2_desc,
        },
        StepDescriptor {
            number: 3,
            title: step3_title,
            description: step3_desc,
        },
        StepDescriptor {
            number: 4,
            title: "Commission",
            description: "Commission preferences and currency",
        },
        StepDescriptor {
            number: 5,
            title: step5_title,
            description: step5_desc,
        },
    ]
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// Validate that a step number is within the valid range.
pub fn validate_step_number(step: u8) -> Result<(), CoreError> {
    if step < MIN_STEP || step > MAX_STEP {
        return Err(CoreError::Validation(format!(
            "Step {step} is out of range ({MIN_STEP}..{MAX_STEP})"
        )));
    }
    Ok(())
}

/// The navigation gate: a step is reachable when it is step 1 or its
/// predecessor has been completed. Backward navigation to any reachable
/// step is always allowed.
pub fn can_navigate_to(target: u8, completed: &BTreeSet<u8>) -> bool {
    if target < MIN_STEP || target > MAX_STEP {
        return false;
    }
    target == MIN_STEP || completed.contains(&(target - 1))
}

// ---------------------------------------------------------------------------
// Per-step validation
// ---------------------------------------------------------------------------

/// Validate that `fields` satisfy the completion requirements for a
/// step. Called before the step is marked complete and the cursor
/// advances; a failure leaves the session on the current step.
pub fn validate_step(
    flow: Flow,
    role: UserRole,
    step: u8,
    fields: &SessionFields,
) -> Result<(), CoreError> {
    validate_step_number(step)?;

    match step {
        1 => validate_basics(fields),
        2 => match (&fields.role_fields, role) {
            (RoleFields::Influencer { profile, .. }, UserRole::Influencer) => {
                if !profile.social_links.any() {
                    return Err(CoreError::Validation(
                        "Step 2 requires at least one social media link".to_string(),
                    ));
                }
                if profile.audience_size.is_empty() {
                    return Err(CoreError::Validation(
                        "Step 2 requires an audience size".to_string(),
                    ));
                }
                if profile.niche_tags.is_empty() {
                    return Err(CoreError::Validation(
                        "Step 2 requires at least one niche tag".to_string(),
                    ));
                }
                if profile.bio.is_empty() {
                    return Err(CoreError::Validation("Step 2 requires a bio".to_string()));
                }
                Ok(())
            }
            (RoleFields::Brand { profile, .. }, UserRole::Brand) => {
                let required = [
                    ("legalEntityName", &profile.legal_entity_name),
                    ("tradeName", &profile.trade_name),
                    ("website", &profile.website),
                    ("supportEmail", &profile.support_email),
                    ("businessAddress", &profile.business_address),
                    ("businessPhone", &profile.business_phone),
                    ("taxCountry", &profile.tax_country),
                ];
                for (key, value) in required {
                    if value.is_empty() {
                        return Err(CoreError::Validation(format!(
                            "Step 2 requires '{key}'"
                        )));
                    }
                }
                Ok(())
            }
            _ => Err(CoreError::Validation(
                "Session fields do not match the session role".to_string(),
            )),
        },
        3 => match flow {
            Flow::Demo => {
                if !fields.documents_complete {
                    return Err(CoreError::Validation(
                        "Step 3 requires the document checklist to be confirmed".to_string(),
                    ));
                }
                Ok(())
            }
            Flow::Standard => match (&fields.role_fields, role) {
                (RoleFields::Influencer { verification, .. }, UserRole::Influencer) => {
                    if verification.id_document.is_none() {
                        return Err(CoreError::Validation(
                            "Step 3 requires an identity document".to_string(),
                        ));
                    }
                    if verification.selfie_photo.is_none() {
                        return Err(CoreError::Validation(
                            "Step 3 requires a selfie photo".to_string(),
                        ));
                    }
                    Ok(())
                }
                (RoleFields::Brand { verification, .. }, UserRole::Brand) => {
                    if verification.business_registration.is_none() {
                        return Err(CoreError::Validation(
                            "Step 3 requires a business registration document".to_string(),
                        ));
                    }
                    if verification.authorized_rep_id.is_none() {
                        return Err(CoreError::Validation(
                            "Step 3 requires an authorized representative ID".to_string(),
                        ));
                    }
                    if verification.bank_account_book.is_none() {
                        return Err(CoreError::Validation(
                            "Step 3 requires a bank account book document".to_string(),
                        ));
                    }
                    Ok(())
                }
                _ => Err(CoreError::Validation(
                    "Session fields do not match the session role".to_string(),
                )),
            },
        },
        4 => validate_commission(fields),
        // Step 5 gathers no data of its own; completion is handled by submit.
        5 => Ok(()),
        _ => unreachable!("step number validated above"),
    }
}

fn validate_basics(fields: &SessionFields) -> Result<(), CoreError> {
    let b = &fields.basics;
    let required = [
        ("name", &b.name),
        ("displayName", &b.display_name),
        ("country", &b.country),
        ("phone", &b.phone),
    ];
    for (key, value) in required {
        if value.is_empty() {
            return Err(CoreError::Validation(format!("Step 1 requires '{key}'")));
        }
    }
    if !b.phone_verified {
        return Err(CoreError::Validation(
            "Step 1 requires a verified phone number".to_string(),
        ));
    }
    Ok(())
}

fn validate_commission(fields: &SessionFields) -> Result<(), CoreError> {
    let c = &fields.commission;
    for (key, value) in [
        ("defaultCommission", c.default_commission),
        ("minCommission", c.min_commission),
        ("maxCommission", c.max_commission),
    ] {
        match value {
            None => {
                return Err(CoreError::Validation(format!("Step 4 requires '{key}'")));
            }
            Some(v) if !(0.0..=100.0).contains(&v) => {
                return Err(CoreError::Validation(format!(
                    "'{key}' must be between 0 and 100"
                )));
            }
            Some(_) => {}
        }
    }
    // Presence checked above.
    let (min, default, max) = (
        c.min_commission.unwrap_or(0.0),
        c.default_commission.unwrap_or(0.0),
        c.max_commission.unwrap_or(0.0),
    );
    if min > default || default > max {
        return Err(CoreError::Validation(
            "Commission values must satisfy min <= default <= max".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{DocumentHandle, DocumentType};
    use crate::fields::SocialLinks;

    fn handle(doc_type: DocumentType) -> DocumentHandle {
        DocumentHandle {
            upload_id: "u-1".to_string(),
            doc_type,
        }
    }

    fn valid_basics(fields: &mut SessionFields) {
        fields.basics.name = "Ada Lovelace".to_string();
        fields.basics.display_name = "ada".to_string();
        fields.basics.country = "KR".to_string();
        fields.basics.phone = "+821012345678".to_string();
        fields.basics.phone_verified = true;
    }

    // -- OnboardingStatus --

    #[test]
    fn status_from_str_valid() {
        assert_eq!(
            OnboardingStatus::from_str_db("draft").unwrap(),
            OnboardingStatus::Draft
        );
        assert_eq!(
            OnboardingStatus::from_str_db("completed").unwrap(),
            OnboardingStatus::Completed
        );
    }

    #[test]
    fn status_from_str_invalid() {
        assert!(OnboardingStatus::from_str_db("in_progress").is_err());
        assert!(OnboardingStatus::from_str_db("").is_err());
    }

    #[test]
    fn status_as_str_roundtrip() {
        for status in [OnboardingStatus::Draft, OnboardingStatus::Completed] {
            assert_eq!(OnboardingStatus::from_str_db(status.as_str()).unwrap(), status);
        }
    }

    // -- step sequence --

    #[test]
    fn sequence_has_five_numbered_steps() {
        for flow in [Flow::Standard, Flow::Demo] {
            for role in [UserRole::Influencer, UserRole::Brand] {
                let steps = step_sequence_for(flow, role);
                for (i, step) in steps.iter().enumerate() {
                    assert_eq!(step.number, i as u8 + 1);
                    assert!(!step.title.is_empty());
                    assert!(!step.description.is_empty());
                }
            }
        }
    }

    #[test]
    fn demo_flow_swaps_verification_for_checklist() {
        let standard = step_sequence_for(Flow::Standard, UserRole::Influencer);
        let demo = step_sequence_for(Flow::Demo, UserRole::Influencer);
        assert_eq!(standard[2].title, "Verification");
        assert_eq!(demo[2].title, "Document Upload");
        assert_eq!(demo[4].title, "Complete");
    }

    // -- navigation gate --

    #[test]
    fn step_one_always_reachable() {
        assert!(can_navigate_to(1, &BTreeSet::new()));
    }

    #[test]
    fn step_reachable_only_after_predecessor_completed() {
        let completed = BTreeSet::from([1, 2]);
        assert!(can_navigate_to(2, &completed));
        assert!(can_navigate_to(3, &completed));
        assert!(!can_navigate_to(4, &completed));
        assert!(!can_navigate_to(5, &completed));
    }

    #[test]
    fn gate_rejects_out_of_range() {
        let completed = BTreeSet::from([1, 2, 3, 4, 5]);
        assert!(!can_navigate_to(0, &completed));
        assert!(!can_navigate_to(6, &completed));
    }

    #[test]
    fn backward_navigation_allowed_with_gaps_completed() {
        // Completing 1 and 2 leaves 1, 2, and 3 all reachable.
        let completed = BTreeSet::from([1, 2]);
        for target in 1..=3 {
            assert!(can_navigate_to(target, &completed));
        }
    }

    // -- validate_step_number --

    #[test]
    fn validate_step_number_range() {
        for n in MIN_STEP..=MAX_STEP {
            assert!(validate_step_number(n).is_ok());
        }
        assert!(validate_step_number(0).is_err());
        assert!(validate_step_number(6).is_err());
    }

    // -- step 1 --

    #[test]
    fn step1_requires_all_basics() {
        let mut fields = SessionFields::for_role(UserRole::Influencer);
        assert!(validate_step(Flow::Standard, UserRole::Influencer, 1, &fields).is_err());
        valid_basics(&mut fields);
        assert!(validate_step(Flow::Standard, UserRole::Influencer, 1, &fields).is_ok());
    }

    #[test]
    fn step1_requires_phone_verified() {
        let mut fields = SessionFields::for_role(UserRole::Influencer);
        valid_basics(&mut fields);
        fields.basics.phone_verified = false;
        assert!(validate_step(Flow::Standard, UserRole::Influencer, 1, &fields).is_err());
    }

    // -- step 2 --

    #[test]
    fn step2_influencer_requires_profile_details() {
        let mut fields = SessionFields::for_role(UserRole::Influencer);
        assert!(validate_step(Flow::Standard, UserRole::Influencer, 2, &fields).is_err());

        if let RoleFields::Influencer { profile, .. } = &mut fields.role_fields {
            profile.social_links = SocialLinks {
                instagram: Some("@ada".to_string()),
                ..SocialLinks::default()
            };
            profile.audience_size = "10k-50k".to_string();
            profile.niche_tags = vec!["tech".to_string()];
            profile.bio = "I build things".to_string();
        }
        assert!(validate_step(Flow::Standard, UserRole::Influencer, 2, &fields).is_ok());
    }

    #[test]
    fn step2_influencer_requires_some_social_link() {
        let mut fields = SessionFields::for_role(UserRole::Influencer);
        if let RoleFields::Influencer { profile, .. } = &mut fields.role_fields {
            profile.audience_size = "10k-50k".to_string();
            profile.niche_tags = vec!["tech".to_string()];
            profile.bio = "bio".to_string();
            // An empty-string link does not count.
            profile.social_links.youtube = Some(String::new());
        }
        assert!(validate_step(Flow::Standard, UserRole::Influencer, 2, &fields).is_err());
    }

    #[test]
    fn step2_brand_requires_all_business_fields() {
        let mut fields = SessionFields::for_role(UserRole::Brand);
        if let RoleFields::Brand { profile, .. } = &mut fields.role_fields {
            profile.legal_entity_name = "Acme Co Ltd".to_string();
            profile.trade_name = "Acme".to_string();
            profile.website = "https://acme.example".to_string();
            profile.support_email = "support@acme.example".to_string();
            profile.business_address = "1 Main St".to_string();
            profile.business_phone = "+821000000000".to_string();
            // tax_country left empty
        }
        assert!(validate_step(Flow::Standard, UserRole::Brand, 2, &fields).is_err());
        if let RoleFields::Brand { profile, .. } = &mut fields.role_fields {
            profile.tax_country = "KR".to_string();
        }
        assert!(validate_step(Flow::Standard, UserRole::Brand, 2, &fields).is_ok());
    }

    // -- step 3 --

    #[test]
    fn step3_influencer_requires_id_and_selfie() {
        let mut fields = SessionFields::for_role(UserRole::Influencer);
        assert!(validate_step(Flow::Standard, UserRole::Influencer, 3, &fields).is_err());

        if let RoleFields::Influencer { verification, .. } = &mut fields.role_fields {
            verification.id_document = Some(handle(DocumentType::IdDocument));
        }
        assert!(validate_step(Flow::Standard, UserRole::Influencer, 3, &fields).is_err());

        if let RoleFields::Influencer { verification, .. } = &mut fields.role_fields {
            verification.selfie_photo = Some(handle(DocumentType::SelfiePhoto));
        }
        assert!(validate_step(Flow::Standard, UserRole::Influencer, 3, &fields).is_ok());
    }

    #[test]
    fn step3_brand_requires_three_documents() {
        let mut fields = SessionFields::for_role(UserRole::Brand);
        if let RoleFields::Brand { verification, .. } = &mut fields.role_fields {
            verification.business_registration = Some(handle(DocumentType::BusinessRegistration));
            verification.authorized_rep_id = Some(handle(DocumentType::AuthorizedRepId));
        }
        assert!(validate_step(Flow::Standard, UserRole::Brand, 3, &fields).is_err());
        if let RoleFields::Brand { verification, .. } = &mut fields.role_fields {
            verification.bank_account_book = Some(handle(DocumentType::BankAccountBook));
        }
        assert!(validate_step(Flow::Standard, UserRole::Brand, 3, &fields).is_ok());
    }

    #[test]
    fn step3_demo_requires_checklist_flag() {
        let mut fields = SessionFields::for_role(UserRole::Influencer);
        assert!(validate_step(Flow::Demo, UserRole::Influencer, 3, &fields).is_err());
        fields.documents_complete = true;
        assert!(validate_step(Flow::Demo, UserRole::Influencer, 3, &fields).is_ok());
    }

    // -- step 4 --

    #[test]
    fn step4_requires_all_three_rates() {
        let mut fields = SessionFields::for_role(UserRole::Influencer);
        assert!(validate_step(Flow::Standard, UserRole::Influencer, 4, &fields).is_err());
        fields.commission.default_commission = Some(15.0);
        fields.commission.min_commission = Some(10.0);
        fields.commission.max_commission = Some(25.0);
        assert!(validate_step(Flow::Standard, UserRole::Influencer, 4, &fields).is_ok());
    }

    #[test]
    fn step4_rejects_out_of_range_rates() {
        let mut fields = SessionFields::for_role(UserRole::Influencer);
        fields.commission.default_commission = Some(115.0);
        fields.commission.min_commission = Some(10.0);
        fields.commission.max_commission = Some(120.0);
        assert!(validate_step(Flow::Standard, UserRole::Influencer, 4, &fields).is_err());
    }

    #[test]
    fn step4_rejects_inverted_ordering() {
        let mut fields = SessionFields::for_role(UserRole::Influencer);
        fields.commission.default_commission = Some(5.0);
        fields.commission.min_commission = Some(10.0);
        fields.commission.max_commission = Some(25.0);
        assert!(validate_step(Flow::Standard, UserRole::Influencer, 4, &fields).is_err());
    }

    // -- step 5 --

    #[test]
    fn step5_has_no_field_requirements() {
        let fields = SessionFields::for_role(UserRole::Influencer);
        assert!(validate_step(Flow::Standard, UserRole::Influencer, 5, &fields).is_ok());
        assert!(validate_step(Flow::Demo, UserRole::Influencer, 5, &fields).is_ok());
    }
}
