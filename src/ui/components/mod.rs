mod help;
mod status;

pub use help::KEY_HELP;

/// Small stateless pieces shared by the screens.
pub struct UiComponent;
