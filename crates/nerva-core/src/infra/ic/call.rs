use crate::{
    cdk::{
        call::{Call as IcCall, CallFailed, RejectCode, Response as IcResponse},
        candid::{CandidType, Principal, encode_one},
    },
    infra::InfraError,
};
use serde::de::DeserializeOwned;

///
/// Call
/// Raw IC call builder; failures come back classified by delivery.
///

pub struct Call;

impl Call {
    /// Builder for read-only calls, which are safe to time out.
    #[must_use]
    pub fn bounded_wait(canister_id: Principal, method: &str) -> CallBuilder {
        CallBuilder {
            wait: WaitMode::Bounded,
            canister_id,
            method: method.to_string(),
            args: None,
        }
    }

    /// Builder for state-changing calls; waits for the real outcome.
    #[must_use]
    pub fn unbounded_wait(canister_id: Principal, method: &str) -> CallBuilder {
        CallBuilder {
            wait: WaitMode::Unbounded,
            canister_id,
            method: method.to_string(),
            args: None,
        }
    }
}

///
/// CallBuilder
///

pub struct CallBuilder {
    wait: WaitMode,
    canister_id: Principal,
    method: String,
    args: Option<Vec<u8>>,
}

impl CallBuilder {
    pub fn try_with_arg<A: CandidType>(mut self, arg: A) -> Result<Self, InfraError> {
        let bytes = encode_one(arg).map_err(|err| InfraError::Encode {
            method: self.method.clone(),
            message: err.to_string(),
        })?;
        self.args = Some(bytes);

        Ok(self)
    }

    pub async fn execute(self) -> Result<CallResult, InfraError> {
        let mut call = match self.wait {
            WaitMode::Bounded => IcCall::bounded_wait(self.canister_id, &self.method),
            WaitMode::Unbounded => IcCall::unbounded_wait(self.canister_id, &self.method),
        };
        if let Some(ref args) = self.args {
            call = call.with_raw_args(args);
        }

        let response = call
            .await
            .map_err(|err| classify_failure(&self.method, &err))?;

        Ok(CallResult {
            method: self.method,
            inner: response,
        })
    }
}

///
/// CallResult
///

pub struct CallResult {
    method: String,
    inner: IcResponse,
}

impl CallResult {
    pub fn candid<R>(&self) -> Result<R, InfraError>
    where
        R: CandidType + DeserializeOwned,
    {
        self.inner.candid().map_err(|err| InfraError::Decode {
            method: self.method.clone(),
            message: err.to_string(),
        })
    }
}

#[derive(Clone, Copy, Debug)]
enum WaitMode {
    Bounded,
    Unbounded,
}

// Only a SYS_UNKNOWN reject leaves the outcome open; every other failure
// means the callee's state did not change.
fn classify_failure(method: &str, err: &CallFailed) -> InfraError {
    let method = method.to_string();
    let message = err.to_string();

    match err {
        CallFailed::CallRejected(rejected)
            if matches!(rejected.reject_code(), Ok(RejectCode::SysUnknown)) =>
        {
            InfraError::OutcomeUnknown { method, message }
        }
        CallFailed::InsufficientLiquidCycleBalance(_)
        | CallFailed::CallPerformFailed(_)
        | CallFailed::CallRejected(_) => InfraError::NotExecuted { method, message },
    }
}
