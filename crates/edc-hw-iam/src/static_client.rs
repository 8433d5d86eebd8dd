//! In-memory [`IdentityClient`].

use async_trait::async_trait;
use edc_hw_core::TemporaryCredential;
use parking_lot::Mutex;

use crate::client::{IdentityClient, SecurityTokenRequest};
use crate::error::{IamError, IamResult};

#[derive(Debug, Default)]
struct State {
    requests: Vec<SecurityTokenRequest>,
    failures: Vec<IamError>,
}

/// Answers every request with the same credential and records the requests.
#[derive(Debug)]
pub struct StaticIdentityClient {
    credential: TemporaryCredential,
    state: Mutex<State>,
}

impl StaticIdentityClient {
    /// Create a client that issues `credential`.
    #[must_use]
    pub fn new(credential: TemporaryCredential) -> Self {
        Self {
            credential,
            state: Mutex::new(State::default()),
        }
    }

    /// Fail the next `times` requests with `error`.
    pub fn fail_times(&self, error: IamError, times: usize) {
        let mut state = self.state.lock();
        state
            .failures
            .extend(std::iter::repeat_n(error, times));
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<SecurityTokenRequest> {
        self.state.lock().requests.clone()
    }
}

#[async_trait]
impl IdentityClient for StaticIdentityClient {
    async fn create_security_token(
        &self,
        request: &SecurityTokenRequest,
    ) -> IamResult<TemporaryCredential> {
        let mut state = self.state.lock();
        state.requests.push(request.clone());
        if state.failures.is_empty() {
            Ok(self.credential.clone())
        } else {
            Err(state.failures.remove(0))
        }
    }
}
