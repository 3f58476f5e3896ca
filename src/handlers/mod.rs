pub mod cadastra_handlers;
pub mod layout_handlers;
pub mod page_handlers;
pub mod plot_handlers;

pub use cadastra_handlers::{save_cadastra, save_polygon};
pub use layout_handlers::bibiani_layout;
pub use page_handlers::{index, not_found};
pub use plot_handlers::{create_plot, delete_plot, get_plot, list_plots, update_plot};
