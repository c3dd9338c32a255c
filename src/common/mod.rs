// SPDX-License-Identifier: MIT

pub mod clock;
pub mod error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{PipelineError, Result, WarpError};
