//! Optimistic write tracking for mutable device properties.

/// A device property with a last-confirmed value and an optional pending write.
///
/// The pending value is what the caller asked for and has not yet been seen
/// on the device. It is only ever cleared by a matching observation or by an
/// explicit [`DualState::clear_pending`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DualState<T> {
    confirmed: Option<T>,
    pending: Option<T>,
}

impl<T: Copy + PartialEq> DualState<T> {
    /// Create an empty state with nothing confirmed and nothing pending.
    pub fn new() -> Self {
        Self {
            confirmed: None,
            pending: None,
        }
    }

    /// Record a value read from (or notified by) the device.
    ///
    /// Returns `true` if this acknowledged and cleared a pending write.
    pub fn observe(&mut self, value: T) -> bool {
        self.confirmed = Some(value);
        if self.pending == Some(value) {
            self.pending = None;
            return true;
        }
        false
    }

    /// Record that the device accepted a write of `value` ahead of its own
    /// report. The pending value stays until a matching observation.
    pub fn assume_confirmed(&mut self, value: T) {
        self.confirmed = Some(value);
    }

    /// Record that the caller wants the device to take `value`.
    pub fn request_write(&mut self, value: T) {
        self.pending = Some(value);
    }

    /// Last value observed from the device.
    pub fn confirmed(&self) -> Option<T> {
        self.confirmed
    }

    /// Requested value awaiting confirmation.
    pub fn pending(&self) -> Option<T> {
        self.pending
    }

    /// Value to show observers: the pending write if any, else the confirmed value.
    pub fn effective(&self) -> Option<T> {
        self.pending.or(self.confirmed)
    }

    /// Whether a pending write differs from what the device reports.
    pub fn needs_write(&self) -> bool {
        match self.pending {
            Some(pending) => self.confirmed != Some(pending),
            None => false,
        }
    }

    /// The pending value, but only while it still differs from the device.
    pub fn outstanding(&self) -> Option<T> {
        self.pending.filter(|_| self.needs_write())
    }

    /// Drop the pending write, returning it.
    pub fn clear_pending(&mut self) -> Option<T> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_prefers_pending() {
        let mut fan = DualState::new();
        assert_eq!(fan.effective(), None);

        fan.observe(false);
        assert_eq!(fan.effective(), Some(false));

        fan.request_write(true);
        assert_eq!(fan.effective(), Some(true));
        assert_eq!(fan.confirmed(), Some(false));
        assert!(fan.needs_write());
        assert_eq!(fan.outstanding(), Some(true));
    }

    #[test]
    fn test_matching_observation_clears_pending() {
        let mut target = DualState::new();
        target.request_write(185u32);

        assert!(!target.observe(170));
        assert_eq!(target.pending(), Some(185));

        assert!(target.observe(185));
        assert_eq!(target.pending(), None);
        assert_eq!(target.effective(), Some(185));
        assert!(!target.needs_write());
    }

    #[test]
    fn test_pending_without_confirmation_needs_write() {
        let mut heater: DualState<bool> = DualState::default();
        heater.request_write(true);
        assert!(heater.needs_write());
        assert_eq!(heater.clear_pending(), Some(true));
        assert!(!heater.needs_write());
        assert_eq!(heater.effective(), None);
    }

    #[test]
    fn test_assumed_confirmation_keeps_pending() {
        let mut heater = DualState::new();
        heater.observe(false);
        heater.request_write(true);

        heater.assume_confirmed(true);
        assert!(!heater.needs_write());
        assert_eq!(heater.pending(), Some(true));

        // The device disagrees after all
        assert!(!heater.observe(false));
        assert!(heater.needs_write());
    }

    #[test]
    fn test_pending_equal_to_confirmed_is_not_a_write() {
        let mut fan = DualState::new();
        fan.observe(true);
        fan.request_write(true);
        assert!(!fan.needs_write());
        assert_eq!(fan.outstanding(), None);
        // Still pending until the next observation acknowledges it
        assert_eq!(fan.pending(), Some(true));
        assert!(fan.observe(true));
    }
}
