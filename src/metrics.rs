//! Counter names and one-time registration.
//! No recorder is installed here; the host application decides where series go.

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

pub const FEED_FETCH_ERRORS: &str = "widgets_feed_fetch_errors_total";
pub const TOGGLE_TOTAL: &str = "widgets_toggle_total";
pub const INTERACTION_SUBMIT: &str = "widgets_interaction_submit_total";
pub const INTERACTION_SUBMIT_ERRORS: &str = "widgets_interaction_submit_errors_total";
pub const PROMPT_OPENED: &str = "widgets_prompt_opened_total";
pub const FEEDBACK_SUBMIT: &str = "widgets_feedback_submit_total";

/// One-time metrics registration (so series show up with help text).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(FEED_FETCH_ERRORS, "content.list fetches that failed.");
        describe_counter!(TOGGLE_TOTAL, "Optimistic interaction toggles applied.");
        describe_counter!(
            INTERACTION_SUBMIT,
            "interactions.submit mutations sent to the backend."
        );
        describe_counter!(
            INTERACTION_SUBMIT_ERRORS,
            "interactions.submit mutations that failed or were rejected."
        );
        describe_counter!(PROMPT_OPENED, "Update prompts opened.");
        describe_counter!(FEEDBACK_SUBMIT, "feedback.submit mutations sent.");
    });
}

pub(crate) fn incr(name: &'static str) {
    ensure_described();
    counter!(name).increment(1);
}
