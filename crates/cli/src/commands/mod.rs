pub mod build;
pub mod info;
pub mod init;
pub mod new_project;
pub mod util;

pub use build::*;
pub use info::*;
pub use init::*;
pub use new_project::*;
pub use util::*;
