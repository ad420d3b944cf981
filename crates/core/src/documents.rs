//! Verification document taxonomy and upload handles.
//!
//! Uploaded files never enter the session state as bytes. A successful
//! upload yields an opaque [`DocumentHandle`] that marks the slot as
//! submitted; the review step re-validates slots by presence only.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::UserRole;

/// Maximum accepted upload size (10 MB).
pub const MAX_DOCUMENT_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// The document slots a user can upload into, across both roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    // Influencer KYC
    IdDocument,
    SelfiePhoto,
    ProofOfAddress,
    BankStatement,
    // Brand KYB
    BusinessRegistration,
    RetailPermit,
    BankAccountBook,
    AuthorizedRepId,
}

impl DocumentType {
    /// Parse a document type string from the database or a request.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "id_document" => Ok(Self::IdDocument),
            "selfie_photo" => Ok(Self::SelfiePhoto),
            "proof_of_address" => Ok(Self::ProofOfAddress),
            "bank_statement" => Ok(Self::BankStatement),
            "business_registration" => Ok(Self::BusinessRegistration),
            "retail_permit" => Ok(Self::RetailPermit),
            "bank_account_book" => Ok(Self::BankAccountBook),
            "authorized_rep_id" => Ok(Self::AuthorizedRepId),
            _ => Err(CoreError::Validation(format!(
                "Invalid document type '{s}'"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdDocument => "id_document",
            Self::SelfiePhoto => "selfie_photo",
            Self::ProofOfAddress => "proof_of_address",
            Self::BankStatement => "bank_statement",
            Self::BusinessRegistration => "business_registration",
            Self::RetailPermit => "retail_permit",
            Self::BankAccountBook => "bank_account_book",
            Self::AuthorizedRepId => "authorized_rep_id",
        }
    }

    /// All document types a given role may upload.
    pub fn allowed_for(role: UserRole) -> &'static [DocumentType] {
        match role {
            UserRole::Influencer => &[
                Self::IdDocument,
                Self::SelfiePhoto,
                Self::ProofOfAddress,
                Self::BankStatement,
            ],
            UserRole::Brand => &[
                Self::BusinessRegistration,
                Self::RetailPermit,
                Self::BankAccountBook,
                Self::AuthorizedRepId,
            ],
        }
    }

    /// The document types that must be present before the final submit
    /// is accepted for a given role.
    pub fn required_for(role: UserRole) -> &'static [DocumentType] {
        match role {
            UserRole::Influencer => &[Self::IdDocument, Self::SelfiePhoto],
            UserRole::Brand => &[
                Self::BusinessRegistration,
                Self::AuthorizedRepId,
                Self::BankAccountBook,
            ],
        }
    }
}

/// Opaque marker for a completed upload.
///
/// Serializes into the session snapshot so a reload keeps the slot
/// marked as submitted, but the file content itself is write-only from
/// the client's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentHandle {
    /// Server-assigned upload identifier.
    pub upload_id: String,
    /// The slot this upload fills.
    pub doc_type: DocumentType,
}

/// Validate an upload's size against [`MAX_DOCUMENT_SIZE_BYTES`].
pub fn validate_document_size(size_bytes: u64) -> Result<(), CoreError> {
    if size_bytes == 0 {
        return Err(CoreError::Validation("File is empty".to_string()));
    }
    if size_bytes > MAX_DOCUMENT_SIZE_BYTES {
        return Err(CoreError::Validation(format!(
            "File size {}MB exceeds maximum {}MB",
            size_bytes / (1024 * 1024),
            MAX_DOCUMENT_SIZE_BYTES / (1024 * 1024),
        )));
    }
    Ok(())
}

/// Validate an upload's MIME type. Only images and PDFs are accepted.
pub fn validate_content_type(content_type: &str) -> Result<(), CoreError> {
    if content_type.starts_with("image/") || content_type == "application/pdf" {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unsupported content type '{content_type}'. Only images and PDFs are allowed"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_type_roundtrip() {
        for role in [UserRole::Influencer, UserRole::Brand] {
            for dt in DocumentType::allowed_for(role) {
                assert_eq!(DocumentType::from_str_db(dt.as_str()).unwrap(), *dt);
            }
        }
    }

    #[test]
    fn doc_type_invalid() {
        assert!(DocumentType::from_str_db("passport").is_err());
        assert!(DocumentType::from_str_db("").is_err());
    }

    #[test]
    fn required_subset_of_allowed() {
        for role in [UserRole::Influencer, UserRole::Brand] {
            let allowed = DocumentType::allowed_for(role);
            for required in DocumentType::required_for(role) {
                assert!(allowed.contains(required));
            }
        }
    }

    #[test]
    fn size_limits() {
        assert!(validate_document_size(0).is_err());
        assert!(validate_document_size(1).is_ok());
        assert!(validate_document_size(MAX_DOCUMENT_SIZE_BYTES).is_ok());
        assert!(validate_document_size(MAX_DOCUMENT_SIZE_BYTES + 1).is_err());
    }

    #[test]
    fn content_types() {
        assert!(validate_content_type("image/png").is_ok());
        assert!(validate_content_type("image/jpeg").is_ok());
        assert!(validate_content_type("application/pdf").is_ok());
        assert!(validate_content_type("text/html").is_err());
        assert!(validate_content_type("application/zip").is_err());
    }
}
