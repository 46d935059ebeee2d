//! Chronologically sortable push keys.
//!
//! A key is 20 characters: 8 encode the creation time in milliseconds, 12
//! are random. Keys minted in the same millisecond reuse the previous random
//! part incremented by one, so keys from one generator sort in creation
//! order. The alphabet is in ASCII order, which makes byte-wise and
//! lexicographic comparison agree.

use chrono::Utc;
use parking_lot::Mutex;
use rand::Rng;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const TIME_LEN: usize = 8;
const RANDOM_LEN: usize = 12;

/// Length of a generated key.
pub const PUSH_ID_LEN: usize = TIME_LEN + RANDOM_LEN;

#[derive(Debug, Default)]
struct PushState {
    last_time: i64,
    last_random: [u8; RANDOM_LEN],
}

/// Generator of push keys. One instance per store.
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    state: Mutex<PushState>,
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a key for the current time.
    pub fn next_id(&self) -> String {
        self.next_id_at(Utc::now().timestamp_millis())
    }

    /// Mint a key as if the clock read `now_millis`.
    ///
    /// A clock that moves backwards is treated as standing still.
    pub fn next_id_at(&self, now_millis: i64) -> String {
        let mut state = self.state.lock();
        let mut now = now_millis.max(state.last_time);

        if now == state.last_time && !increment(&mut state.last_random) {
            // Every random digit overflowed; borrow the next millisecond.
            now += 1;
        }
        if now != state.last_time {
            let mut rng = rand::thread_rng();
            for digit in state.last_random.iter_mut() {
                *digit = rng.gen_range(0..64);
            }
            state.last_time = now;
        }

        let mut id = String::with_capacity(PUSH_ID_LEN);
        id.push_str(&encode_time(now));
        id.extend(
            state
                .last_random
                .iter()
                .map(|&digit| PUSH_CHARS[digit as usize] as char),
        );
        id
    }
}

/// Add one to a base-64 number stored most significant digit first.
///
/// Returns false on overflow.
fn increment(digits: &mut [u8; RANDOM_LEN]) -> bool {
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return true;
        }
    }
    false
}

fn encode_time(millis: i64) -> String {
    let mut remaining = millis.max(0) as u64;
    let mut chars = [b'-'; TIME_LEN];
    for slot in chars.iter_mut().rev() {
        *slot = PUSH_CHARS[(remaining % 64) as usize];
        remaining /= 64;
    }
    chars.iter().map(|&c| c as char).collect()
}
