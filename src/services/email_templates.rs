//! Transactional email rendering
//!
//! Every template produces a subject, an HTML body and a plain-text body.
//! Values interpolated into the HTML part are escaped; the text part is left
//! as-is.

use chrono::NaiveDateTime;
use serde::Serialize;

/// A rendered email ready to hand to the email integration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Escapes the characters that are significant in HTML text and attributes
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Formats cents as US dollars, e.g. `123456` as `$1,234.56`
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let dollars = (cents / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, digit) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

fn layout(heading: &str, inner_html: &str) -> String {
    format!(
        "<!DOCTYPE html><html><body style=\"font-family: sans-serif; color: #1f2937;\">\
         <div style=\"max-width: 560px; margin: 0 auto; padding: 24px;\">\
         <h1 style=\"color: #6d28d9; font-size: 22px;\">{}</h1>{}\
         <p style=\"color: #6b7280; font-size: 12px; margin-top: 32px;\">Elevra Community</p>\
         </div></body></html>",
        escape_html(heading),
        inner_html
    )
}

fn button(href: &str, label: &str) -> String {
    format!(
        "<p><a href=\"{}\" style=\"background: #6d28d9; color: #fff; padding: 10px 16px; \
         border-radius: 6px; text-decoration: none;\">{}</a></p>",
        escape_html(href),
        escape_html(label)
    )
}

/// Details shown on a donation receipt
#[derive(Debug, Clone)]
pub struct ReceiptDetails<'a> {
    pub donation_id: i32,
    pub donor_name: &'a str,
    pub candidate_name: &'a str,
    pub amount_cents: i64,
    pub fee_cents: i64,
    pub total_cents: i64,
    pub cover_fee: bool,
    pub paid_at: NaiveDateTime,
}

pub fn donation_receipt(details: &ReceiptDetails<'_>) -> RenderedEmail {
    let subject = format!("Your donation to {} is confirmed", details.candidate_name);
    let date = details.paid_at.format("%B %-d, %Y").to_string();
    let fee_line = if details.cover_fee {
        format!("Processing fee (covered by you): {}", format_cents(details.fee_cents))
    } else {
        format!("Processing fee (deducted): {}", format_cents(details.fee_cents))
    };

    let html = layout(
        "Thank you for your donation",
        &format!(
            "<p>Hi {},</p><p>Your contribution to <strong>{}</strong> has been received.</p>\
             <table style=\"border-collapse: collapse;\">\
             <tr><td>Receipt</td><td>#{}</td></tr>\
             <tr><td>Date</td><td>{}</td></tr>\
             <tr><td>Donation</td><td>{}</td></tr>\
             <tr><td colspan=\"2\">{}</td></tr>\
             <tr><td><strong>Total charged</strong></td><td><strong>{}</strong></td></tr>\
             </table>",
            escape_html(details.donor_name),
            escape_html(details.candidate_name),
            details.donation_id,
            escape_html(&date),
            format_cents(details.amount_cents),
            escape_html(&fee_line),
            format_cents(details.total_cents),
        ),
    );

    let text = format!(
        "Hi {},\n\nYour contribution to {} has been received.\n\n\
         Receipt: #{}\nDate: {}\nDonation: {}\n{}\nTotal charged: {}\n",
        details.donor_name,
        details.candidate_name,
        details.donation_id,
        date,
        format_cents(details.amount_cents),
        fee_line,
        format_cents(details.total_cents),
    );

    RenderedEmail { subject, html, text }
}

pub fn validation_approved(full_name: &str, candidate_name: &str, profile_url: &str) -> RenderedEmail {
    let subject = "Your candidate profile has been verified".to_string();
    let html = layout(
        "You're verified",
        &format!(
            "<p>Hi {},</p><p>Your request to manage the profile of <strong>{}</strong> was approved. \
             You can now edit your page, collect endorsements and receive donations.</p>{}",
            escape_html(full_name),
            escape_html(candidate_name),
            button(profile_url, "Open your profile"),
        ),
    );
    let text = format!(
        "Hi {},\n\nYour request to manage the profile of {} was approved. \
         You can now edit your page, collect endorsements and receive donations.\n\n{}\n",
        full_name, candidate_name, profile_url
    );
    RenderedEmail { subject, html, text }
}

pub fn validation_denied(full_name: &str, candidate_name: &str) -> RenderedEmail {
    let subject = "Update on your profile verification request".to_string();
    let html = layout(
        "Verification request update",
        &format!(
            "<p>Hi {},</p><p>We could not verify your request to manage the profile of \
             <strong>{}</strong>. Reply to this email if you believe this is a mistake.</p>",
            escape_html(full_name),
            escape_html(candidate_name),
        ),
    );
    let text = format!(
        "Hi {},\n\nWe could not verify your request to manage the profile of {}. \
         Reply to this email if you believe this is a mistake.\n",
        full_name, candidate_name
    );
    RenderedEmail { subject, html, text }
}

pub fn notification(title: &str, body: &str, link: Option<&str>) -> RenderedEmail {
    let mut inner = format!("<p>{}</p>", escape_html(body));
    let mut text = format!("{}\n\n{}\n", title, body);
    if let Some(link) = link {
        inner.push_str(&button(link, "View on Elevra"));
        text.push_str(&format!("\n{}\n", link));
    }
    RenderedEmail {
        subject: title.to_string(),
        html: layout(title, &inner),
        text,
    }
}

pub fn endorsement_received(candidate_name: &str, endorser_name: &str, content: &str, profile_url: &str) -> RenderedEmail {
    let subject = format!("{} endorsed you on Elevra", endorser_name);
    let html = layout(
        "You have a new endorsement",
        &format!(
            "<p>Hi {},</p><p><strong>{}</strong> wrote:</p>\
             <blockquote style=\"border-left: 3px solid #6d28d9; padding-left: 12px;\">{}</blockquote>{}",
            escape_html(candidate_name),
            escape_html(endorser_name),
            escape_html(content),
            button(profile_url, "See your endorsements"),
        ),
    );
    let text = format!(
        "Hi {},\n\n{} wrote:\n\n{}\n\n{}\n",
        candidate_name, endorser_name, content, profile_url
    );
    RenderedEmail { subject, html, text }
}
