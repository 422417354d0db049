use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("service unavailable")]
    Unavailable,
    #[error("user {0} not found")]
    NotFound(u64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub age: u32,
}

/// A fake remote user service counting the requests it serves.
///
/// The first `failures` requests fail with `RemoteError::Unavailable`.
#[derive(Clone, Debug, Default)]
pub struct UserService {
    requests: Arc<AtomicUsize>,
    failures: usize,
}

#[allow(dead_code)]
impl UserService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_first(failures: usize) -> Self {
        UserService {
            requests: Arc::new(AtomicUsize::new(0)),
            failures,
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub async fn fetch_user(&self, id: u64) -> Result<User, RemoteError> {
        let request = self.requests.fetch_add(1, Ordering::SeqCst);
        sleep(Duration::from_millis(20)).await;
        if request < self.failures {
            return Err(RemoteError::Unavailable);
        }
        match id {
            1 => Ok(User {
                id,
                name: "Ada".to_string(),
                age: 36,
            }),
            2 => Ok(User {
                id,
                name: "Tim".to_string(),
                age: 15,
            }),
            _ => Err(RemoteError::NotFound(id)),
        }
    }
}
