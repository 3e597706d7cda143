pub mod resource_card;
pub mod resource_form;
pub mod resource_map;
pub mod search_filters;
pub mod toasts;
