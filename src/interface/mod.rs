pub mod prompts;
pub mod render;

pub use prompts::{
    match_items, prompt_category, prompt_credentials, prompt_funding, prompt_item,
    prompt_menu_action, prompt_menu_patch, prompt_order_draft, prompt_quantity_delta,
    prompt_registration, prompt_search, prompt_yes_no, MenuAction,
};
pub use render::{
    display_cart, display_checkout_state, display_history, display_kitchen_board,
    display_menu_page, display_notice, display_order, display_payment_initiation,
    display_profile, display_verification, draft_summary,
};
