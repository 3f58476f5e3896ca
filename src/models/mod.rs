pub mod cadastra;
pub mod plot;
pub mod user;

pub use cadastra::{Cadastra, CadastraDraft, CadastraForm};
pub use plot::{Plot, PlotDraft, PlotForm};
pub use user::{CurrentUser, User};
