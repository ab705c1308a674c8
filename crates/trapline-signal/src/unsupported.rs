use core::marker::PhantomData;

use crate::error::SignalError;
use crate::plan::{Signal, TrapPlan};

pub struct ArmedTraps {
    plan: TrapPlan,
    _not_send: PhantomData<*mut ()>,
}

impl ArmedTraps {
    pub fn plan(&self) -> &TrapPlan {
        &self.plan
    }

    pub fn disarm(self) {}
}

pub fn is_armed() -> bool {
    false
}

/// Only the empty plan can be armed here.
pub fn arm(plan: &TrapPlan) -> Result<ArmedTraps, SignalError> {
    if !plan.is_empty() {
        return Err(SignalError::Unsupported);
    }
    Ok(ArmedTraps {
        plan: *plan,
        _not_send: PhantomData,
    })
}

pub fn handler_address(_signal: Signal) -> Result<usize, SignalError> {
    Err(SignalError::Unsupported)
}
