use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Captcha codes live for five minutes, matching the delivery email copy.
pub const CAPTCHA_TTL_SECONDS: i64 = 300;

struct Entry {
    code: String,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    codes: HashMap<String, Entry>,
    last_issued: Option<String>,
}

/// Time-boxed, single-use captcha codes, keyed by `{email}_{request_id}`.
///
/// This is the only piece of shared in-process state the service carries.
/// Codes are purged lazily whenever a new one is issued.
#[derive(Clone, Default)]
pub struct CaptchaStore {
    inner: Arc<Mutex<Inner>>,
}

impl CaptchaStore {
    /// Generates a five-digit code and stores it under `key`.
    pub fn issue(&self, key: String) -> String {
        let code = rand::thread_rng().gen_range(10_000..=99_999).to_string();
        let now = Utc::now();

        let mut inner = self.inner.lock().expect("captcha store lock poisoned");
        inner.codes.retain(|_, entry| entry.expires_at > now);
        inner.last_issued = Some(code.clone());
        inner.codes.insert(
            key,
            Entry {
                code: code.clone(),
                expires_at: now + Duration::seconds(CAPTCHA_TTL_SECONDS),
            },
        );
        code
    }

    /// Returns true when `code` matches the live entry under `key`, removing
    /// it so that every code can be redeemed at most once. A wrong guess
    /// leaves the entry in place until it expires.
    pub fn check_and_consume(&self, key: &str, code: &str) -> bool {
        let now = Utc::now();
        let mut inner = self.inner.lock().expect("captcha store lock poisoned");
        match inner.codes.get(key) {
            Some(entry) if entry.expires_at > now && entry.code == code => {
                inner.codes.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Most recently issued code. Integration tests read this instead of an
    /// inbox; real deployments deliver codes out of band.
    pub fn last_issued(&self) -> Option<String> {
        self.inner
            .lock()
            .expect("captcha store lock poisoned")
            .last_issued
            .clone()
    }
}
