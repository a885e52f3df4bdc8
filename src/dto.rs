use serde::{Deserialize, Serialize};

use crate::models::{
    BlockContent, Candidate, Donation, DonorInfo, ElectionLink, NotificationKind, Subscription, User,
    ValidationStatus, VendorStatus,
};
use crate::services::batch::BatchPrompt;

/// Default page size for list endpoints
pub const DEFAULT_LIMIT: i64 = 50;

/// Largest page size a list endpoint will return
pub const MAX_LIMIT: i64 = 100;

/// Resolves list pagination, capping the limit at [`MAX_LIMIT`]
///
/// ### Returns
///
/// `(limit, offset)`, or a message when either value is negative or the limit is zero
pub fn page(limit: Option<i64>, offset: Option<i64>) -> Result<(i64, i64), String> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if limit < 1 {
        return Err(format!("limit must be at least 1, got {}", limit));
    }
    let offset = offset.unwrap_or(0);
    if offset < 0 {
        return Err(format!("offset must not be negative, got {}", offset));
    }
    Ok((limit.min(MAX_LIMIT), offset))
}

/// Maps a patch value onto a nullable column update
///
/// Absent leaves the column alone, a blank string clears it, anything else
/// sets it to the trimmed value.
pub fn patch_nullable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Plain pagination for list endpoints without other filters
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct PageQueryDto {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ── Candidates ───────────────────────────────────────────────────────

/// Query parameters for listing candidates
///
/// `ids` may be repeated: `?ids=1&ids=2`.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CandidateQueryDto {
    /// Case-insensitive match against name, position and party
    pub search: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub verified: Option<bool>,
    pub ids: Vec<i32>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Data transfer object for creating a candidate
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CreateCandidateDto {
    pub name: String,
    pub party: Option<String>,
    pub position: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub photo_url: Option<String>,
}

/// Data transfer object for updating a candidate
///
/// Only the fields present are changed. `verified` and `hidden` are
/// reserved for staff.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct UpdateCandidateDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
}

/// Replacement list for a candidate's profile page
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReplaceContentBlocksDto {
    pub blocks: Vec<BlockContent>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CreateEndorsementDto {
    pub content: String,
    pub relationship: Option<String>,
    /// Defaults to the name on the endorser's account
    pub endorser_name: Option<String>,
    /// Defaults to public
    pub is_public: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct ViewStatsQueryDto {
    pub days: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RecordedDto {
    pub recorded: bool,
}

// ── Elections ────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct ElectionQueryDto {
    pub city: Option<String>,
    pub state: Option<String>,
    /// Only elections dated today or later
    pub upcoming: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Data transfer object for creating an election
///
/// `election_date` is an ISO date (`YYYY-MM-DD`).
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CreateElectionDto {
    pub position: String,
    pub election_date: String,
    pub city: String,
    pub state: String,
    pub description: Option<String>,
    pub seats: Option<i32>,
    pub election_type: Option<String>,
    pub hidden: Option<bool>,
}

/// Race-specific details attached when linking a candidate to an election
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct LinkCandidateDto {
    pub party: Option<String>,
    pub policies: Vec<String>,
    pub sources: Vec<String>,
    pub additional_notes: Option<String>,
    pub voting_link: Option<String>,
}

/// A candidate on an election's ballot
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ElectionCandidateDto {
    pub candidate: Candidate,
    pub link: ElectionLink,
}

// ── Donations ────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct FeeQuoteDto {
    pub amount_cents: i64,
    pub cover_fee: bool,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CheckoutDto {
    pub candidate_id: i32,
    pub amount_cents: i64,
    pub cover_fee: bool,
    pub donor: DonorInfo,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CheckoutResponseDto {
    pub donation: Donation,
    pub checkout_url: String,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct ConfirmDonationDto {
    pub session_id: String,
}

// ── Vendors ──────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct VendorQueryDto {
    pub search: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CreateVendorDto {
    pub name: String,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub category: Option<String>,
}

/// Data transfer object for updating a vendor
///
/// `status` and `subscription` are reserved for staff.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct UpdateVendorDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<VendorStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Subscription>,
}

// ── Notifications ────────────────────────────────────────────────────

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct NotificationQueryDto {
    /// Only unread notifications
    pub unread: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CreateNotificationDto {
    /// Recipient
    pub clerk_user_id: String,
    /// Defaults to SYSTEM
    pub kind: Option<NotificationKind>,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
    /// Also email the recipient, if email is configured
    pub send_email: bool,
    /// Overrides the address stored on the recipient's user record
    pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UpdatedCountDto {
    pub updated: usize,
}

// ── Validation requests ──────────────────────────────────────────────

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct ValidationQueryDto {
    pub status: Option<ValidationStatus>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CreateValidationRequestDto {
    pub candidate_id: i32,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

// ── Uploads, resolver, batch jobs, admin ─────────────────────────────

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct UploadRequestDto {
    /// candidate-photo, content-image, content-video or vendor-portfolio
    pub kind: String,
    pub content_type: String,
    pub size_bytes: u64,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct ResolveQueryDto {
    pub q: String,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CreateBatchJobDto {
    pub display_name: String,
    /// Defaults to the configured model
    pub model: Option<String>,
    pub prompts: Vec<BatchPrompt>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct RunTaskDto {
    pub params: serde_json::Map<String, serde_json::Value>,
}

/// The caller's identity together with their stored user record
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MeDto {
    pub user_id: String,
    pub email: Option<String>,
    pub is_admin: bool,
    pub is_sub_admin: bool,
    pub role: Option<String>,
    pub user: User,
}
