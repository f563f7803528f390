mod account;
mod admin;
mod catalogue;
mod practice;

pub use account::{
    delete_me, get_me, get_notifications, health_check, identity_webhook, update_email,
    update_name, update_notifications,
};
pub use admin::{
    create_template, delete_template, list_all_templates, list_users, set_role, stats,
    update_template,
};
pub use catalogue::{
    get_template, list_templates, popular_templates, recommended_templates, template_facets,
};
pub use practice::{
    call_status, complete_session, generate_feedback, get_feedback, recent_sessions, start_call,
    start_practice, stop_call,
};
