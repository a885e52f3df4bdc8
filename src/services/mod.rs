/// Domain services
///
/// Pure helpers used by the handlers: fee arithmetic, slugs, input checks,
/// email rendering, view aggregation, route resolution, the batch-job
/// tracker and the admin task registry.

pub mod fees;
pub mod slug;
pub mod validation;
pub mod email_templates;
pub mod view_stats;
pub mod resolver;
pub mod batch;
pub mod admin_tasks;
