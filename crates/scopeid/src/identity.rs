use crate::{Error, IdentityField, Result, ScopedId};

/// The immutable `(worker_id, datacenter_id)` pair baked into every ID this
/// process issues.
///
/// Within a datacenter no two running instances may share a worker ID; the
/// cluster sanity check enforces that at startup.
///
/// # Example
///
/// ```
/// use scopeid::Identity;
///
/// let identity = Identity::new(2, 1).unwrap();
/// assert_eq!(identity.worker_id(), 2);
/// assert_eq!(identity.datacenter_id(), 1);
///
/// assert!(Identity::new(16, 0).is_err());
/// assert!(Identity::new(0, -1).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Identity {
    worker_id: u8,
    datacenter_id: u8,
}

impl Identity {
    /// Validates and builds an identity.
    ///
    /// Accepts signed values so that flags and wire messages can be passed
    /// through unchanged; negatives are rejected rather than wrapped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentity`] if `worker_id` is outside `0..=15`
    /// or `datacenter_id` is outside `0..=7`.
    pub fn new(worker_id: i64, datacenter_id: i64) -> Result<Self> {
        let worker_id = check(IdentityField::WorkerId, worker_id, ScopedId::max_worker_id())?;
        let datacenter_id = check(
            IdentityField::DatacenterId,
            datacenter_id,
            ScopedId::max_datacenter_id(),
        )?;
        Ok(Self {
            worker_id,
            datacenter_id,
        })
    }

    pub const fn worker_id(&self) -> u8 {
        self.worker_id
    }

    pub const fn datacenter_id(&self) -> u8 {
        self.datacenter_id
    }
}

fn check(field: IdentityField, value: i64, max: u64) -> Result<u8> {
    u64::try_from(value)
        .ok()
        .filter(|v| *v <= max)
        .and_then(|v| u8::try_from(v).ok())
        .ok_or(Error::InvalidIdentity { field, value, max })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_full_range() {
        for worker in 0..=15 {
            for dc in 0..=7 {
                let identity = Identity::new(worker, dc).unwrap();
                assert_eq!(i64::from(identity.worker_id()), worker);
                assert_eq!(i64::from(identity.datacenter_id()), dc);
            }
        }
    }

    #[test]
    fn rejects_worker_out_of_range() {
        let err = Identity::new(16, 0).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidIdentity {
                field: IdentityField::WorkerId,
                value: 16,
                max: 15,
            }
        );
        assert_eq!(err.to_string(), "invalid worker id 16 (must be in 0-15)");
    }

    #[test]
    fn rejects_datacenter_out_of_range() {
        let err = Identity::new(0, 8).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidIdentity {
                field: IdentityField::DatacenterId,
                value: 8,
                max: 7,
            }
        ));
    }

    #[test]
    fn rejects_negative_values() {
        assert!(Identity::new(-1, 0).is_err());
        assert!(Identity::new(0, -1).is_err());
        assert!(Identity::new(i64::MIN, i64::MIN).is_err());
    }
}
