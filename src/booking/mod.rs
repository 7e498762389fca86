pub mod flow;
pub mod registry;
pub mod session;

pub use flow::{BookingFlow, Collaborators, FlowSnapshot};
pub use registry::{SessionGuard, SessionRegistry};
pub use session::{BookingSession, BookingStep, SessionSnapshot};
