//! Building blocks for Gibbs samplers: GIG variates, burn-in/thinning
//! schedules and posterior averaging.

pub mod chain;
pub mod gig;
pub mod schedule;
pub mod traits;

pub use chain::{McmcTrace, RunningMean};
pub use gig::{sample_gig, Gig, GigEnvelope, GigError};
pub use schedule::{SampleSchedule, ScheduleError};
pub use traits::McmcParam;
