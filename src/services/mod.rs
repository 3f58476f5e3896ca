pub mod auth_service;
pub mod cadastra_service;
pub mod layout_service;
pub mod password;
pub mod plot_number;
pub mod plot_service;
pub mod upload_service;
pub mod user_service;
pub mod validation;

pub use auth_service::{AuthService, AuthServiceError, LoginRequest};
pub use cadastra_service::{CadastraService, CadastraServiceError};
pub use layout_service::{LayoutError, LayoutService};
pub use plot_number::{PlotNumberError, PlotNumberGenerator};
pub use plot_service::{PlotService, PlotServiceError};
pub use upload_service::{UploadError, UploadStore};
pub use user_service::{RegisterRequest, UserService, UserServiceError};
