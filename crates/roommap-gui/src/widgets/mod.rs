mod cards;
pub mod modals;
mod search_form;

pub use cards::{FindmatesPanel, SidebarCards};
pub use search_form::SearchPanel;
