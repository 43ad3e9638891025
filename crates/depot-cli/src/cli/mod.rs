mod list;
mod space;
mod sync;
mod verify;

pub use list::ListCmd;
pub use space::SpaceCmd;
pub use sync::SyncCmd;
pub use verify::VerifyCmd;
