//! Connection state machine.
//!
//! The channel's state is a single [`ConnectionState`] value. Every change
//! goes through [`ConnectionState::next`], a pure function of the current
//! state, a [`Signal`] and the [`RetryPolicy`]; signals that make no sense in
//! the current state yield `None` and leave it untouched.

use std::time::Duration;

/// Where the channel is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No live transport. `retry` says whether and when another attempt
    /// happens.
    Disconnected { retry: Retry },
    /// Handshake `attempt` (1-based, consecutive) is in flight.
    Connecting { attempt: u32 },
    /// Handshake done and topic subscribed.
    Connected,
}

/// Reconnect situation while disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retry {
    /// Never connected, or explicitly disconnected.
    Idle,
    /// Attempt `attempt` starts after `delay`.
    Scheduled { attempt: u32, delay: Duration },
    /// Every allowed attempt failed; only an explicit `connect()` restarts.
    Exhausted,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::Disconnected { retry: Retry::Idle }
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// External `connect()` call.
    Connect,
    HandshakeSucceeded,
    HandshakeFailed,
    /// The transport ended without being asked to.
    TransportClosed,
    /// A scheduled reconnect delay elapsed.
    RetryDue,
    /// External `disconnect()` call.
    Disconnect,
}

/// Bounds on reconnecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive handshake attempts allowed, the first one included.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before attempt `attempt`: `base × max(attempt − 1, 1)`.
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.base_delay * attempt.saturating_sub(1).max(1)
    }
}

impl ConnectionState {
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    #[must_use]
    pub const fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting { .. })
    }

    /// Whether the channel currently holds or is acquiring a transport, or
    /// will try again on its own.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(
            self,
            Self::Disconnected {
                retry: Retry::Idle | Retry::Exhausted
            }
        )
    }

    /// The state after `signal`, or `None` if the signal does not apply.
    #[must_use]
    pub fn next(self, signal: Signal, policy: &RetryPolicy) -> Option<Self> {
        use ConnectionState::{Connected, Connecting, Disconnected};

        match (self, signal) {
            (Disconnected { retry: Retry::Idle | Retry::Exhausted }, Signal::Connect) => {
                Some(Connecting { attempt: 1 })
            }
            (Disconnected { retry: Retry::Scheduled { attempt, .. } }, Signal::RetryDue) => {
                Some(Connecting { attempt })
            }
            (Connecting { .. }, Signal::HandshakeSucceeded) => Some(Connected),
            (Connecting { attempt }, Signal::HandshakeFailed | Signal::TransportClosed) => {
                Some(Self::after_failure(attempt, policy))
            }
            (Connected, Signal::TransportClosed) => Some(Disconnected {
                retry: Retry::Scheduled {
                    attempt: 1,
                    delay: policy.delay_before(1),
                },
            }),
            (Connecting { .. } | Connected, Signal::Disconnect)
            | (
                Disconnected {
                    retry: Retry::Scheduled { .. } | Retry::Exhausted,
                },
                Signal::Disconnect,
            ) => Some(Disconnected { retry: Retry::Idle }),
            _ => None,
        }
    }

    fn after_failure(attempt: u32, policy: &RetryPolicy) -> Self {
        if attempt >= policy.max_attempts {
            return Self::Disconnected {
                retry: Retry::Exhausted,
            };
        }
        let next = attempt + 1;
        Self::Disconnected {
            retry: Retry::Scheduled {
                attempt: next,
                delay: policy.delay_before(next),
            },
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected { retry: Retry::Idle } => write!(f, "disconnected"),
            Self::Disconnected {
                retry: Retry::Scheduled { attempt, delay },
            } => write!(f, "reconnecting (attempt {attempt} in {}ms)", delay.as_millis()),
            Self::Disconnected {
                retry: Retry::Exhausted,
            } => write!(f, "offline (gave up reconnecting)"),
            Self::Connecting { attempt } => write!(f, "connecting (attempt {attempt})"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const POLICY: RetryPolicy = RetryPolicy {
        max_attempts: 5,
        base_delay: Duration::from_secs(3),
    };

    fn step(state: ConnectionState, signal: Signal) -> ConnectionState {
        state.next(signal, &POLICY).unwrap()
    }

    #[test]
    fn test_linear_delay() {
        assert_eq!(POLICY.delay_before(1), Duration::from_secs(3));
        assert_eq!(POLICY.delay_before(2), Duration::from_secs(3));
        assert_eq!(POLICY.delay_before(3), Duration::from_secs(6));
        assert_eq!(POLICY.delay_before(5), Duration::from_secs(12));
    }

    #[test]
    fn test_happy_path() {
        let state = step(ConnectionState::default(), Signal::Connect);
        assert_eq!(state, ConnectionState::Connecting { attempt: 1 });
        let state = step(state, Signal::HandshakeSucceeded);
        assert!(state.is_connected());
    }

    #[test]
    fn test_connect_is_ignored_while_active() {
        let connecting = ConnectionState::Connecting { attempt: 1 };
        assert_eq!(connecting.next(Signal::Connect, &POLICY), None);
        assert_eq!(ConnectionState::Connected.next(Signal::Connect, &POLICY), None);
        let scheduled = ConnectionState::Disconnected {
            retry: Retry::Scheduled {
                attempt: 2,
                delay: Duration::from_secs(3),
            },
        };
        assert_eq!(scheduled.next(Signal::Connect, &POLICY), None);
    }

    #[test]
    fn test_failures_exhaust_after_max_attempts() {
        let mut state = step(ConnectionState::default(), Signal::Connect);
        for attempt in 1..POLICY.max_attempts {
            assert_eq!(state, ConnectionState::Connecting { attempt });
            state = step(state, Signal::HandshakeFailed);
            assert_eq!(
                state,
                ConnectionState::Disconnected {
                    retry: Retry::Scheduled {
                        attempt: attempt + 1,
                        delay: POLICY.delay_before(attempt + 1),
                    }
                }
            );
            state = step(state, Signal::RetryDue);
        }
        assert_eq!(state, ConnectionState::Connecting { attempt: 5 });
        let state = step(state, Signal::HandshakeFailed);
        assert_eq!(
            state,
            ConnectionState::Disconnected {
                retry: Retry::Exhausted
            }
        );
        assert_eq!(state.next(Signal::RetryDue, &POLICY), None);
        assert!(!state.is_active());

        // An explicit connect starts over.
        assert_eq!(
            step(state, Signal::Connect),
            ConnectionState::Connecting { attempt: 1 }
        );
    }

    #[test]
    fn test_close_after_connected_schedules_fresh_retry() {
        let state = step(ConnectionState::Connected, Signal::TransportClosed);
        assert_eq!(
            state,
            ConnectionState::Disconnected {
                retry: Retry::Scheduled {
                    attempt: 1,
                    delay: Duration::from_secs(3)
                }
            }
        );
    }

    #[test]
    fn test_disconnect_goes_idle_from_anywhere_active() {
        for state in [
            ConnectionState::Connecting { attempt: 3 },
            ConnectionState::Connected,
            ConnectionState::Disconnected {
                retry: Retry::Exhausted,
            },
        ] {
            assert_eq!(step(state, Signal::Disconnect), ConnectionState::default());
        }
        assert_eq!(ConnectionState::default().next(Signal::Disconnect, &POLICY), None);
    }

    #[test]
    fn test_stray_signals_are_rejected() {
        let idle = ConnectionState::default();
        assert_eq!(idle.next(Signal::HandshakeSucceeded, &POLICY), None);
        assert_eq!(idle.next(Signal::TransportClosed, &POLICY), None);
        assert_eq!(ConnectionState::Connected.next(Signal::HandshakeFailed, &POLICY), None);
    }
}
