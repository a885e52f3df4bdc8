/// Data models module
///
/// This module defines the core data structures used throughout the application.
/// It includes database models that map to database tables, as well as methods
/// for creating and manipulating these models.

mod text_enum;

mod json_value;
pub use json_value::JsonValue;

mod user;
pub use user::{NewUser, User, UserRole};

mod candidate;
pub use candidate::{Candidate, CandidateChanges, NewCandidate};

mod election;
pub use election::{Election, ElectionLink, ElectionType, NewElection};

mod donation;
pub use donation::{Donation, DonationStatus, DonationSummary, DonorInfo, NewDonation};

mod vendor;
pub use vendor::{NewVendor, Subscription, Vendor, VendorChanges, VendorStatus};

mod notification;
pub use notification::{NewNotification, Notification, NotificationKind};

mod content_block;
pub use content_block::{default_template, BlockContent, BlockKind, ContentBlock, ListStyle, NewContentBlock};

mod endorsement;
pub use endorsement::{Endorsement, NewEndorsement};

mod validation_request;
pub use validation_request::{NewValidationRequest, UserValidationRequest, ValidationStatus};

mod candidate_view;
pub use candidate_view::{CandidateView, NewCandidateView};

mod batch_job;
pub use batch_job::{BatchJob, JobSnapshot, JobStatus, NewBatchJob};
